//! Version-independent credentials and their per-version projection

use serde_json::Value;
use url::Url;

use crate::discover::{ApiVersion, VersionFamily};
use crate::error::{AuthError, Result};
use crate::plugins::{v2, v3, ExtraParams, VersionedPlugin};

pub(crate) const V2_DOMAIN_SCOPE: &str = "Cannot use v2 authentication with domain scope";

/// Scope and behaviour options shared by every generic credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseScope {
    pub domain_id: Option<String>,
    pub domain_name: Option<String>,
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    pub project_domain_id: Option<String>,
    pub project_domain_name: Option<String>,
    pub trust_id: Option<String>,
    /// Allow fetching a new token when the current one expires
    pub reauthenticate: bool,
}

impl Default for BaseScope {
    fn default() -> Self {
        Self {
            domain_id: None,
            domain_name: None,
            project_id: None,
            project_name: None,
            project_domain_id: None,
            project_domain_name: None,
            trust_id: None,
            reauthenticate: true,
        }
    }
}

fn put(params: &mut ExtraParams, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        params.insert(key.to_string(), Value::String(v.clone()));
    }
}

impl BaseScope {
    /// True when the scope names a domain, which v2 cannot express
    pub fn has_domain_scope(&self) -> bool {
        self.domain_id.is_some()
            || self.domain_name.is_some()
            || self.project_domain_id.is_some()
            || self.project_domain_name.is_some()
    }

    /// Parameters handed to every v2 plugin; projects become tenants
    pub fn v2_params(&self) -> ExtraParams {
        let mut params = ExtraParams::new();
        put(&mut params, "trust_id", &self.trust_id);
        put(&mut params, "tenant_id", &self.project_id);
        put(&mut params, "tenant_name", &self.project_name);
        params.insert("reauthenticate".to_string(), Value::Bool(self.reauthenticate));
        params
    }

    /// Parameters handed to every v3 plugin
    pub fn v3_params(&self) -> ExtraParams {
        let mut params = ExtraParams::new();
        put(&mut params, "domain_id", &self.domain_id);
        put(&mut params, "domain_name", &self.domain_name);
        put(&mut params, "project_id", &self.project_id);
        put(&mut params, "project_name", &self.project_name);
        put(&mut params, "project_domain_id", &self.project_domain_id);
        put(&mut params, "project_domain_name", &self.project_domain_name);
        put(&mut params, "trust_id", &self.trust_id);
        params.insert("reauthenticate".to_string(), Value::Bool(self.reauthenticate));
        params
    }
}

/// Username/password credential
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PasswordCredential {
    pub username: Option<String>,
    pub user_id: Option<String>,
    pub password: Option<String>,
    pub user_domain_id: Option<String>,
    pub user_domain_name: Option<String>,
}

impl std::fmt::Debug for PasswordCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordCredential")
            .field("username", &self.username)
            .field("user_id", &self.user_id)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("user_domain_id", &self.user_domain_id)
            .field("user_domain_name", &self.user_domain_name)
            .finish()
    }
}

impl PasswordCredential {
    fn has_user_domain(&self) -> bool {
        self.user_domain_id.is_some() || self.user_domain_name.is_some()
    }

    fn create_plugin(
        &self,
        scope: &BaseScope,
        version: &ApiVersion,
        url: &Url,
    ) -> Result<Option<VersionedPlugin>> {
        match VersionFamily::of(version) {
            Some(VersionFamily::V2) => {
                if self.has_user_domain() {
                    return Err(AuthError::Configuration(V2_DOMAIN_SCOPE.to_string()).into());
                }
                let plugin = v2::Password::new(
                    url.clone(),
                    self.user_id.clone(),
                    self.username.clone(),
                    self.password.clone(),
                    scope.v2_params(),
                )?;
                Ok(Some(VersionedPlugin::V2Password(plugin)))
            }
            Some(VersionFamily::V3) => {
                let user = v3::User {
                    user_id: self.user_id.clone(),
                    username: self.username.clone(),
                    user_domain_id: self.user_domain_id.clone(),
                    user_domain_name: self.user_domain_name.clone(),
                };
                let plugin =
                    v3::Password::new(url.clone(), user, self.password.clone(), scope.v3_params())?;
                Ok(Some(VersionedPlugin::V3Password(plugin)))
            }
            None => Ok(None),
        }
    }
}

/// Existing-token credential
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TokenCredential {
    pub token: Option<String>,
}

impl std::fmt::Debug for TokenCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCredential")
            .field("token", &self.token.as_ref().map(|_| "********"))
            .finish()
    }
}

impl TokenCredential {
    fn create_plugin(
        &self,
        scope: &BaseScope,
        version: &ApiVersion,
        url: &Url,
    ) -> Result<Option<VersionedPlugin>> {
        match VersionFamily::of(version) {
            Some(VersionFamily::V2) => Ok(Some(VersionedPlugin::V2Token(v2::Token::new(
                url.clone(),
                self.token.clone(),
                scope.v2_params(),
            )?))),
            Some(VersionFamily::V3) => Ok(Some(VersionedPlugin::V3Token(v3::Token::new(
                url.clone(),
                self.token.clone(),
                scope.v3_params(),
            )?))),
            None => Ok(None),
        }
    }
}

/// Credential kinds the generic dispatcher understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Password(PasswordCredential),
    Token(TokenCredential),
}

impl Credential {
    /// Builds the plugin for one discovered version
    ///
    /// Returns `Ok(None)` when the version belongs to no known family.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] when the credential cannot be
    /// used with the version's family (user domain against v2).
    pub fn create_plugin(
        &self,
        scope: &BaseScope,
        version: &ApiVersion,
        url: &Url,
    ) -> Result<Option<VersionedPlugin>> {
        match self {
            Self::Password(c) => c.create_plugin(scope, version, url),
            Self::Token(c) => c.create_plugin(scope, version, url),
        }
    }
}
