//! Named loaders: raw option mapping in, [`GenericPlugin`] out
//!
//! A loader owns the option list of one credential kind. Loading runs alias
//! resolution, then the DNS endpoint fallback, then the required-option
//! check, and finally hands the typed credential to a [`GenericPlugin`]
//! whose versioned construction waits for the first authentication attempt.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::discover::VersionDiscovery;
use crate::dns::{resolve_endpoint, TxtResolver};
use crate::error::{AuthError, Result};
use crate::generic::{BaseScope, Credential, GenericPlugin, PasswordCredential, TokenCredential};
use crate::options::{OptionRegistry, OptionSpec, RawOptions, ResolvedOptions};

/// Names accepted by [`get_plugin_loader`]
pub const LOADER_NAMES: [&str; 2] = ["password", "token"];

const AUTH_URL: &str = "auth-url";

/// Options every identity loader takes
pub fn base_identity_options() -> Vec<OptionSpec> {
    vec![OptionSpec::new(AUTH_URL, "Authentication URL").required()]
}

/// Base options plus the scope options shared by the generic loaders
pub fn generic_base_options() -> Vec<OptionSpec> {
    let mut options = base_identity_options();
    options.extend([
        OptionSpec::new("domain-id", "Domain ID to scope to"),
        OptionSpec::new("domain-name", "Domain name to scope to"),
        OptionSpec::new("project-id", "Project ID to scope to").deprecated("tenant-id"),
        OptionSpec::new("project-name", "Project name to scope to").deprecated("tenant-name"),
        OptionSpec::new("project-domain-id", "Domain ID containing project"),
        OptionSpec::new("project-domain-name", "Domain name containing project"),
        OptionSpec::new("trust-id", "Trust ID"),
    ]);
    options
}

fn base_scope(fields: &ResolvedOptions) -> BaseScope {
    BaseScope {
        domain_id: fields.get_owned("domain_id"),
        domain_name: fields.get_owned("domain_name"),
        project_id: fields.get_owned("project_id"),
        project_name: fields.get_owned("project_name"),
        project_domain_id: fields.get_owned("project_domain_id"),
        project_domain_name: fields.get_owned("project_domain_name"),
        trust_id: fields.get_owned("trust_id"),
        ..Default::default()
    }
}

/// Credential loader for one `auth_type`
#[async_trait]
pub trait Loader: Send + Sync {
    /// Loader name as used in configuration
    fn name(&self) -> &'static str;

    /// Options understood by this loader, base options first
    fn get_options(&self) -> Vec<OptionSpec>;

    /// Builds the version-independent credential
    ///
    /// `fields` is keyed by each option's `dest`, see
    /// [`OptionRegistry::fields`].
    fn build_credential(&self, fields: &ResolvedOptions) -> Result<Credential>;

    /// Registry over [`get_options`](Self::get_options)
    fn registry(&self) -> Result<OptionRegistry> {
        OptionRegistry::new(self.get_options())
    }

    /// Resolves aliases, fills a missing endpoint from DNS and checks
    /// required options
    ///
    /// Pass `None` as `resolver` to skip the DNS fallback.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingOptions`] when a required option is still
    /// absent after the DNS fallback.
    async fn resolve_options(
        &self,
        raw: &RawOptions,
        resolver: Option<&dyn TxtResolver>,
    ) -> Result<ResolvedOptions> {
        let registry = self.registry()?;
        let mut options = registry.resolve(raw);

        let explicit = options.get_owned(AUTH_URL);
        if let Some(url) = resolve_endpoint(explicit.as_deref(), resolver).await {
            options.insert(AUTH_URL, url);
        }

        let missing = registry.missing_required(&options);
        if !missing.is_empty() {
            return Err(AuthError::MissingOptions(missing).into());
        }

        Ok(options)
    }

    /// Loads a ready, not yet discovered, [`GenericPlugin`]
    ///
    /// # Errors
    ///
    /// - [`AuthError::MissingOptions`] for absent required options.
    /// - [`AuthError::Configuration`] for an unparsable `auth-url` or an
    ///   unusable credential shape.
    async fn load_from_options(
        &self,
        raw: &RawOptions,
        resolver: Option<&dyn TxtResolver>,
        discovery: Arc<dyn VersionDiscovery>,
    ) -> Result<GenericPlugin> {
        let registry = self.registry()?;
        let options = self.resolve_options(raw, resolver).await?;

        let url = options
            .get(AUTH_URL)
            .ok_or_else(|| AuthError::MissingOptions(vec![AUTH_URL.to_string()]))?;
        let auth_url = Url::parse(url).map_err(|e| {
            AuthError::Configuration(format!("Invalid {} '{}': {}", AUTH_URL, url, e))
        })?;

        let fields = registry.fields(&options);
        let credential = self.build_credential(&fields)?;
        tracing::debug!(loader = self.name(), url = %auth_url, "Loaded generic identity plugin");

        Ok(GenericPlugin::new(auth_url, credential, discovery).with_scope(base_scope(&fields)))
    }
}

/// Username/password loader
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordLoader;

#[async_trait]
impl Loader for PasswordLoader {
    fn name(&self) -> &'static str {
        "password"
    }

    fn get_options(&self) -> Vec<OptionSpec> {
        let mut options = generic_base_options();
        options.extend([
            OptionSpec::new("user-id", "User id"),
            OptionSpec::new("user-name", "Username")
                .with_dest("username")
                .deprecated("username"),
            OptionSpec::new("user-domain-id", "User's domain id"),
            OptionSpec::new("user-domain-name", "User's domain name"),
            OptionSpec::new("password", "User's password").secret(),
        ]);
        options
    }

    fn build_credential(&self, fields: &ResolvedOptions) -> Result<Credential> {
        let credential = PasswordCredential {
            username: fields.get_owned("username"),
            user_id: fields.get_owned("user_id"),
            password: fields.get_owned("password"),
            user_domain_id: fields.get_owned("user_domain_id"),
            user_domain_name: fields.get_owned("user_domain_name"),
        };

        if credential.username.is_none() && credential.user_id.is_none() {
            return Err(AuthError::Configuration(
                "Password authentication requires either user-name or user-id".to_string(),
            )
            .into());
        }

        Ok(Credential::Password(credential))
    }
}

/// Existing-token loader
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenLoader;

#[async_trait]
impl Loader for TokenLoader {
    fn name(&self) -> &'static str {
        "token"
    }

    fn get_options(&self) -> Vec<OptionSpec> {
        let mut options = generic_base_options();
        options.push(
            OptionSpec::new("token", "Token to authenticate with")
                .secret()
                .required(),
        );
        options
    }

    fn build_credential(&self, fields: &ResolvedOptions) -> Result<Credential> {
        Ok(Credential::Token(TokenCredential {
            token: fields.get_owned("token"),
        }))
    }
}

/// Returns the loader registered under `name`
///
/// # Errors
///
/// Returns [`AuthError::UnknownPluginType`] for anything but `password` and
/// `token`.
///
/// # Examples
///
/// ```
/// use kgauth::loading::get_plugin_loader;
///
/// let loader = get_plugin_loader("password").unwrap();
/// assert_eq!(loader.name(), "password");
/// assert!(get_plugin_loader("kerberos").is_err());
/// ```
pub fn get_plugin_loader(name: &str) -> Result<Box<dyn Loader>> {
    match name {
        "password" => Ok(Box::new(PasswordLoader)),
        "token" => Ok(Box::new(TokenLoader)),
        _ => Err(AuthError::UnknownPluginType(name.to_string()).into()),
    }
}
