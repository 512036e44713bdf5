//! Version-agnostic plugin dispatch
//!
//! A [`GenericPlugin`] is what callers hold before anyone knows which identity
//! API version the endpoint speaks. On the first [`GenericPlugin::get_plugin`]
//! call it:
//!
//! 1. asks the [`VersionDiscovery`] collaborator what the endpoint serves;
//! 2. walks the answer newest-first, skipping v2 when the scope names a
//!    domain;
//! 3. projects the credential onto the first family it can build a plugin for;
//! 4. caches that [`VersionedPlugin`] for every later call.
//!
//! When discovery itself fails the version is guessed from the URL path
//! (`/v2.0`, `/v3`). If nothing usable turns up the call fails with
//! [`AuthError::DiscoveryFailure`].
//!
//! # Concurrency
//!
//! Construction runs inside a [`tokio::sync::OnceCell`]: concurrent first
//! callers wait for a single discovery and all observe the same plugin. A
//! failed attempt leaves the cell empty so the next call retries.

mod credential;

use std::sync::Arc;

use tokio::sync::OnceCell;
use url::Url;

use crate::discover::{ApiVersion, VersionDiscovery, VersionFamily};
use crate::error::{AuthError, Result};
use crate::plugins::VersionedPlugin;

pub use credential::{BaseScope, Credential, PasswordCredential, TokenCredential};

use credential::V2_DOMAIN_SCOPE;

const NO_VERSIONED_ENDPOINTS: &str = "Could not find versioned identity endpoints when attempting \
     to authenticate. Please check that your auth_url is correct.";

/// Credential holder that picks its concrete plugin on first use
pub struct GenericPlugin {
    auth_url: Url,
    scope: BaseScope,
    credential: Credential,
    discovery: Arc<dyn VersionDiscovery>,
    plugin: OnceCell<VersionedPlugin>,
}

impl std::fmt::Debug for GenericPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericPlugin")
            .field("auth_url", &self.auth_url.as_str())
            .field("scope", &self.scope)
            .field("credential", &self.credential)
            .field("plugin", &self.plugin.get())
            .finish_non_exhaustive()
    }
}

impl GenericPlugin {
    /// Creates an unresolved plugin with an empty scope
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use kgauth::discover::{StaticVersionDiscovery, VersionData};
    /// use kgauth::generic::{Credential, GenericPlugin, TokenCredential};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> kgauth::error::Result<()> {
    /// let discovery = Arc::new(StaticVersionDiscovery::new(vec![
    ///     VersionData::new("v3.14", "https://id.example.com/v3/")?,
    /// ]));
    /// let plugin = GenericPlugin::new(
    ///     url::Url::parse("https://id.example.com")?,
    ///     Credential::Token(TokenCredential { token: Some("abc".into()) }),
    ///     discovery,
    /// );
    ///
    /// let concrete = plugin.get_plugin().await?;
    /// assert_eq!(concrete.auth_url().as_str(), "https://id.example.com/v3/");
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(auth_url: Url, credential: Credential, discovery: Arc<dyn VersionDiscovery>) -> Self {
        Self {
            auth_url,
            scope: BaseScope::default(),
            credential,
            discovery,
            plugin: OnceCell::new(),
        }
    }

    /// Sets the shared scope
    pub fn with_scope(mut self, scope: BaseScope) -> Self {
        self.scope = scope;
        self
    }

    /// Unversioned endpoint discovery runs against
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    /// Shared scope
    pub fn scope(&self) -> &BaseScope {
        &self.scope
    }

    /// Version-independent credential
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Builds the plugin for one discovered version, without caching
    ///
    /// Returns `Ok(None)` when `version` belongs to no known family.
    pub fn create_plugin(&self, version: &ApiVersion, url: &Url) -> Result<Option<VersionedPlugin>> {
        self.credential.create_plugin(&self.scope, version, url)
    }

    /// Returns the concrete plugin, discovering and building it on first use
    ///
    /// # Errors
    ///
    /// - [`AuthError::Configuration`] when the credential or scope cannot be
    ///   used with the only families the endpoint offers.
    /// - [`AuthError::DiscoveryFailure`] when no usable version was found.
    pub async fn get_plugin(&self) -> Result<&VersionedPlugin> {
        self.plugin
            .get_or_try_init(|| self.do_create_plugin())
            .await
    }

    /// The cached plugin, if construction already happened
    pub fn cached_plugin(&self) -> Option<&VersionedPlugin> {
        self.plugin.get()
    }

    /// Drops the cached plugin so the next call runs discovery again
    ///
    /// Invalidation needs exclusive access. A plugin shared as
    /// `Arc<GenericPlugin>` for concurrent first use is invalidated by its
    /// owner once the other handles are gone, through [`Arc::get_mut`] or
    /// [`Arc::try_unwrap`].
    pub fn invalidate(&mut self) -> Option<VersionedPlugin> {
        let previous = self.plugin.take();
        if previous.is_some() {
            tracing::debug!(url = %self.auth_url, "Invalidated cached identity plugin");
        }
        previous
    }

    async fn do_create_plugin(&self) -> Result<VersionedPlugin> {
        let versions = match self.discovery.discover(&self.auth_url).await {
            Ok(versions) => versions,
            Err(e) => {
                tracing::warn!(
                    url = %self.auth_url,
                    error = %e,
                    "Failed to discover available identity versions. Attempting to parse version from URL."
                );
                return self
                    .plugin_from_url_path()?
                    .ok_or_else(|| AuthError::DiscoveryFailure(NO_VERSIONED_ENDPOINTS.to_string()).into());
            }
        };

        let mut v2_with_domain_scope = false;
        for data in versions.iter().rev() {
            if VersionFamily::V2.matches(&data.version) && self.scope.has_domain_scope() {
                tracing::debug!(version = %data.version, "Skipping v2 endpoint for domain-scoped credential");
                v2_with_domain_scope = true;
                continue;
            }

            if let Some(plugin) = self.create_plugin(&data.version, &data.url)? {
                tracing::info!(
                    version = %data.version,
                    url = %data.url,
                    "Selected identity API version"
                );
                return Ok(plugin);
            }
        }

        if v2_with_domain_scope {
            return Err(AuthError::Configuration(V2_DOMAIN_SCOPE.to_string()).into());
        }

        Err(AuthError::DiscoveryFailure(NO_VERSIONED_ENDPOINTS.to_string()).into())
    }

    fn plugin_from_url_path(&self) -> Result<Option<VersionedPlugin>> {
        let path = self.auth_url.path().to_lowercase();

        if path.starts_with("/v2.0") {
            if self.scope.has_domain_scope() {
                return Err(AuthError::Configuration(V2_DOMAIN_SCOPE.to_string()).into());
            }
            self.create_plugin(&ApiVersion::new(&[2, 0]), &self.auth_url)
        } else if path.starts_with("/v3") {
            self.create_plugin(&ApiVersion::new(&[3, 0]), &self.auth_url)
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover::{MockVersionDiscovery, StaticVersionDiscovery, VersionData};
    use crate::test_utils::{assert_auth_error, identity_versions as both_versions};
    use std::time::Duration;

    fn password() -> Credential {
        Credential::Password(PasswordCredential {
            username: Some("alice".to_string()),
            password: Some("p".to_string()),
            ..Default::default()
        })
    }

    fn plugin_with(discovery: Arc<dyn VersionDiscovery>, url: &str) -> GenericPlugin {
        GenericPlugin::new(Url::parse(url).unwrap(), password(), discovery)
    }

    #[tokio::test]
    async fn test_prefers_newest_version() {
        let discovery = Arc::new(StaticVersionDiscovery::new(both_versions()));
        let plugin = plugin_with(discovery, "https://id.example.com/");

        let concrete = plugin.get_plugin().await.unwrap();
        assert_eq!(concrete.family(), VersionFamily::V3);
        assert_eq!(concrete.auth_url().as_str(), "https://id.example.com/v3/");
    }

    #[tokio::test]
    async fn test_domain_scope_skips_v2() {
        let discovery = Arc::new(StaticVersionDiscovery::new(vec![
            VersionData::new("v3.0", "https://id.example.com/v3/").unwrap(),
            VersionData::new("v2.0", "https://id.example.com/v2.0/").unwrap(),
        ]));
        let plugin = plugin_with(discovery, "https://id.example.com/").with_scope(BaseScope {
            domain_name: Some("Default".to_string()),
            ..Default::default()
        });

        let concrete = plugin.get_plugin().await.unwrap();
        assert_eq!(concrete.family(), VersionFamily::V3);
    }

    #[tokio::test]
    async fn test_domain_scope_with_only_v2_is_configuration_error() {
        let discovery = Arc::new(StaticVersionDiscovery::new(vec![VersionData::new(
            "v2.0",
            "https://id.example.com/v2.0/",
        )
        .unwrap()]));
        let plugin = plugin_with(discovery, "https://id.example.com/").with_scope(BaseScope {
            project_domain_id: Some("default".to_string()),
            ..Default::default()
        });

        assert_auth_error(plugin.get_plugin().await, AuthError::is_configuration);
    }

    #[tokio::test]
    async fn test_no_known_family_is_discovery_failure() {
        let discovery = Arc::new(StaticVersionDiscovery::new(vec![VersionData::new(
            "v1.1",
            "https://id.example.com/v1.1/",
        )
        .unwrap()]));
        let plugin = plugin_with(discovery, "https://id.example.com/");

        let err = plugin.get_plugin().await.unwrap_err();
        assert!(err.downcast_ref::<AuthError>().unwrap().is_discovery_failure());
        assert!(plugin.cached_plugin().is_none());
    }

    #[tokio::test]
    async fn test_discovery_failure_falls_back_to_v3_path() {
        let discovery = Arc::new(StaticVersionDiscovery::failing("unreachable"));
        let plugin = plugin_with(discovery, "https://id.example.com/v3");

        let concrete = plugin.get_plugin().await.unwrap();
        assert_eq!(concrete.family(), VersionFamily::V3);
        assert_eq!(concrete.auth_url().as_str(), "https://id.example.com/v3");
    }

    #[tokio::test]
    async fn test_discovery_failure_falls_back_to_v2_path() {
        let discovery = Arc::new(StaticVersionDiscovery::failing("unreachable"));
        let plugin = plugin_with(discovery, "https://id.example.com/V2.0/");

        let concrete = plugin.get_plugin().await.unwrap();
        assert_eq!(concrete.family(), VersionFamily::V2);
    }

    #[tokio::test]
    async fn test_discovery_failure_v2_path_with_domain_scope() {
        let discovery = Arc::new(StaticVersionDiscovery::failing("unreachable"));
        let plugin = plugin_with(discovery, "https://id.example.com/v2.0").with_scope(BaseScope {
            domain_id: Some("d".to_string()),
            ..Default::default()
        });

        let err = plugin.get_plugin().await.unwrap_err();
        assert!(err.to_string().contains("domain scope"));
    }

    #[tokio::test]
    async fn test_discovery_failure_unversioned_path() {
        let discovery = Arc::new(StaticVersionDiscovery::failing("unreachable"));
        let plugin = plugin_with(discovery, "https://id.example.com/identity");

        let err = plugin.get_plugin().await.unwrap_err();
        assert!(err.downcast_ref::<AuthError>().unwrap().is_discovery_failure());
    }

    #[tokio::test]
    async fn test_discovery_runs_once_across_calls() {
        let mut mock = MockVersionDiscovery::new();
        mock.expect_discover()
            .times(1)
            .returning(|_| Ok(both_versions()));
        let plugin = plugin_with(Arc::new(mock), "https://id.example.com/");

        let first = plugin.get_plugin().await.unwrap().clone();
        let second = plugin.get_plugin().await.unwrap();
        assert_eq!(&first, second);
    }

    #[tokio::test]
    async fn test_failed_construction_is_retried() {
        let mut mock = MockVersionDiscovery::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_discover()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![VersionData::new("v1.0", "https://id.example.com/v1/").unwrap()]));
        mock.expect_discover()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(both_versions()));
        let plugin = plugin_with(Arc::new(mock), "https://id.example.com/");

        assert!(plugin.get_plugin().await.is_err());
        assert!(plugin.get_plugin().await.is_ok());
    }

    #[tokio::test]
    async fn test_invalidate_triggers_rediscovery() {
        let discovery = Arc::new(StaticVersionDiscovery::new(both_versions()));
        let mut plugin = plugin_with(discovery.clone(), "https://id.example.com/");

        plugin.get_plugin().await.unwrap();
        assert!(plugin.invalidate().is_some());
        assert!(plugin.cached_plugin().is_none());
        plugin.get_plugin().await.unwrap();
        assert_eq!(discovery.calls(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_use_discovers_once() {
        let discovery = Arc::new(
            StaticVersionDiscovery::new(both_versions()).with_delay(Duration::from_millis(50)),
        );
        let plugin = Arc::new(plugin_with(discovery.clone(), "https://id.example.com/"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let plugin = plugin.clone();
                tokio::spawn(async move { plugin.get_plugin().await.map(|p| p.clone()) })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(discovery.calls(), 1);
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shared_plugin_invalidated_after_handles_drop() {
        let discovery = Arc::new(StaticVersionDiscovery::new(both_versions()));
        let mut plugin = Arc::new(plugin_with(discovery.clone(), "https://id.example.com/"));

        let shared = plugin.clone();
        let handle = tokio::spawn(async move { shared.get_plugin().await.map(|p| p.family()) });
        assert_eq!(handle.await.unwrap().unwrap(), VersionFamily::V3);

        let owner = Arc::get_mut(&mut plugin).unwrap();
        assert!(owner.invalidate().is_some());
        plugin.get_plugin().await.unwrap();
        assert_eq!(discovery.calls(), 2);
    }
}
