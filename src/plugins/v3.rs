//! Identity API v3 plugins

use serde::Serialize;
use url::Url;

use super::{mask_secret, ExtraParams, ParamReader};
use crate::error::Result;

/// Domain, project or trust scope of a v3 token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Scope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_domain_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_domain_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_id: Option<String>,
}

fn read_params(plugin: &'static str, params: ExtraParams) -> Result<(Scope, bool)> {
    let mut reader = ParamReader::new(plugin, params);
    let scope = Scope {
        domain_id: reader.string("domain_id")?,
        domain_name: reader.string("domain_name")?,
        project_id: reader.string("project_id")?,
        project_name: reader.string("project_name")?,
        project_domain_id: reader.string("project_domain_id")?,
        project_domain_name: reader.string("project_domain_name")?,
        trust_id: reader.string("trust_id")?,
    };
    let reauthenticate = reader.boolean("reauthenticate", true)?;
    reader.finish()?;
    Ok((scope, reauthenticate))
}

/// Identity of the authenticating user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_domain_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_domain_name: Option<String>,
}

/// v3 username/password plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Password {
    pub auth_url: Url,
    #[serde(flatten)]
    pub user: User,
    #[serde(serialize_with = "mask_secret")]
    pub password: Option<String>,
    #[serde(flatten)]
    pub scope: Scope,
    pub reauthenticate: bool,
}

impl Password {
    /// Builds the plugin from credential fields and v3 extra parameters
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unknown or mistyped parameters.
    pub fn new(
        auth_url: Url,
        user: User,
        password: Option<String>,
        params: ExtraParams,
    ) -> Result<Self> {
        let (scope, reauthenticate) = read_params("v3 password", params)?;
        Ok(Self {
            auth_url,
            user,
            password,
            scope,
            reauthenticate,
        })
    }
}

/// v3 token plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub auth_url: Url,
    #[serde(serialize_with = "mask_secret")]
    pub token: Option<String>,
    #[serde(flatten)]
    pub scope: Scope,
    pub reauthenticate: bool,
}

impl Token {
    /// Builds the plugin from a token and v3 extra parameters
    pub fn new(auth_url: Url, token: Option<String>, params: ExtraParams) -> Result<Self> {
        let (scope, reauthenticate) = read_params("v3 token", params)?;
        Ok(Self {
            auth_url,
            token,
            scope,
            reauthenticate,
        })
    }
}
