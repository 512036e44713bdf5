//! Identity API v2 plugins
//!
//! v2 has no domain concept: scope is a tenant (the v2 name for a project)
//! or a trust.

use serde::Serialize;
use url::Url;

use super::{mask_secret, ExtraParams, ParamReader};
use crate::error::Result;

/// Tenant or trust scope of a v2 token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Scope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
}

/// Reads the v2 extra parameters, leaving nothing behind
fn read_params(plugin: &'static str, params: ExtraParams) -> Result<(Scope, bool)> {
    let mut reader = ParamReader::new(plugin, params);
    let scope = Scope {
        trust_id: reader.string("trust_id")?,
        tenant_id: reader.string("tenant_id")?,
        tenant_name: reader.string("tenant_name")?,
    };
    let reauthenticate = reader.boolean("reauthenticate", true)?;
    reader.finish()?;
    Ok((scope, reauthenticate))
}

/// v2 username/password plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Password {
    pub auth_url: Url,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(serialize_with = "mask_secret")]
    pub password: Option<String>,
    #[serde(flatten)]
    pub scope: Scope,
    pub reauthenticate: bool,
}

impl Password {
    /// Builds the plugin from credential fields and v2 extra parameters
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unknown or mistyped parameters.
    pub fn new(
        auth_url: Url,
        user_id: Option<String>,
        username: Option<String>,
        password: Option<String>,
        params: ExtraParams,
    ) -> Result<Self> {
        let (scope, reauthenticate) = read_params("v2 password", params)?;
        Ok(Self {
            auth_url,
            user_id,
            username,
            password,
            scope,
            reauthenticate,
        })
    }
}

/// v2 token plugin
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
    /// Builds the plugin from a token and v2 extra parameters
    pub fn new(auth_url: Url, token: Option<String>, params: ExtraParams) -> Result<Self> {
        let (scope, reauthenticate) = read_params("v2 token", params)?;
        Ok(Self {
            auth_url,
            token,
            scope,
            reauthenticate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn url() -> Url {
        Url::parse("https://id.example.com/v2.0").unwrap()
    }

    #[test]
    fn test_password_reads_params() {
        let mut params = ExtraParams::new();
        params.insert("tenant_name".to_string(), json!("demo"));
        params.insert("reauthenticate".to_string(), json!(false));

        let plugin = Password::new(
            url(),
            None,
            Some("alice".to_string()),
            Some("p".to_string()),
            params,
        )
        .unwrap();

        assert_eq!(plugin.scope.tenant_name.as_deref(), Some("demo"));
        assert!(!plugin.reauthenticate);
        assert_eq!(plugin.username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_password_rejects_domain_params() {
        let mut params = ExtraParams::new();
        params.insert("user_domain_id".to_string(), json!("default"));
        assert!(Password::new(url(), None, None, None, params).is_err());
    }

    #[test]
    fn test_password_serialization_masks_secret() {
        let plugin = Password::new(
            url(),
            Some("u1".to_string()),
            None,
            Some("hunter2".to_string()),
            ExtraParams::new(),
        )
        .unwrap();
        let value = serde_json::to_value(&plugin).unwrap();
        assert_eq!(value["password"], "********");
        assert_eq!(value["user_id"], "u1");
        assert!(value.get("username").is_none());
    }

    #[test]
    fn test_token_defaults_reauthenticate() {
        let plugin = Token::new(url(), Some("tok".to_string()), ExtraParams::new()).unwrap();
        assert!(plugin.reauthenticate);
        assert_eq!(plugin.scope, Scope::default());
    }
}
