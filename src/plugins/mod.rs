//! Concrete, version-specific credential plugins
//!
//! The dispatcher in [`crate::generic`] builds exactly one of these once it
//! knows which identity API version the endpoint speaks. Each plugin is a
//! typed parameter set; issuing tokens with it is the job of the session
//! layer and out of scope here.
//!
//! Construction follows a single contract: the version-specific constructor
//! receives the credential fields plus an [`ExtraParams`] map of
//! family-specific parameters (scope, trust, reauthentication). Unknown
//! parameters are rejected so nothing supplied is silently lost.

pub mod v2;
pub mod v3;

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use url::Url;

use crate::discover::VersionFamily;
use crate::error::{AuthError, Result};

/// Family-specific extra parameters, opaque to the dispatcher
pub type ExtraParams = BTreeMap<String, serde_json::Value>;

/// The concrete plugin chosen for an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "plugin", rename_all = "snake_case")]
pub enum VersionedPlugin {
    /// Identity v2 username/password
    V2Password(v2::Password),
    /// Identity v2 token
    V2Token(v2::Token),
    /// Identity v3 username/password
    V3Password(v3::Password),
    /// Identity v3 token
    V3Token(v3::Token),
}

impl VersionedPlugin {
    /// Version family the plugin speaks
    pub fn family(&self) -> VersionFamily {
        match self {
            Self::V2Password(_) | Self::V2Token(_) => VersionFamily::V2,
            Self::V3Password(_) | Self::V3Token(_) => VersionFamily::V3,
        }
    }

    /// Versioned endpoint the plugin authenticates against
    pub fn auth_url(&self) -> &Url {
        match self {
            Self::V2Password(p) => &p.auth_url,
            Self::V2Token(p) => &p.auth_url,
            Self::V3Password(p) => &p.auth_url,
            Self::V3Token(p) => &p.auth_url,
        }
    }
}

pub(crate) fn mask_secret<S: Serializer>(
    value: &Option<String>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(_) => serializer.serialize_some("********"),
        None => serializer.serialize_none(),
    }
}

/// Consumes an [`ExtraParams`] map key by key
pub(crate) struct ParamReader {
    params: ExtraParams,
    plugin: &'static str,
}

impl ParamReader {
    pub(crate) fn new(plugin: &'static str, params: ExtraParams) -> Self {
        Self { params, plugin }
    }

    pub(crate) fn string(&mut self, key: &str) -> Result<Option<String>> {
        match self.params.remove(key) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(AuthError::Configuration(format!(
                "{}: parameter '{}' must be a string, got {}",
                self.plugin, key, other
            ))
            .into()),
        }
    }

    pub(crate) fn boolean(&mut self, key: &str, default: bool) -> Result<bool> {
        match self.params.remove(key) {
            None | Some(serde_json::Value::Null) => Ok(default),
            Some(serde_json::Value::Bool(b)) => Ok(b),
            Some(other) => Err(AuthError::Configuration(format!(
                "{}: parameter '{}' must be a boolean, got {}",
                self.plugin, key, other
            ))
            .into()),
        }
    }

    /// Fails if any parameter was not consumed
    pub(crate) fn finish(self) -> Result<()> {
        if self.params.is_empty() {
            return Ok(());
        }
        let keys: Vec<&str> = self.params.keys().map(String::as_str).collect();
        Err(AuthError::Configuration(format!(
            "{}: unexpected parameters: {}",
            self.plugin,
            keys.join(", ")
        ))
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_param_reader_consumes_known_keys() {
        let mut params = ExtraParams::new();
        params.insert("trust_id".to_string(), json!("t1"));
        params.insert("reauthenticate".to_string(), json!(false));
        params.insert("tenant_id".to_string(), serde_json::Value::Null);

        let mut reader = ParamReader::new("test", params);
        assert_eq!(reader.string("trust_id").unwrap(), Some("t1".to_string()));
        assert_eq!(reader.string("tenant_id").unwrap(), None);
        assert!(!reader.boolean("reauthenticate", true).unwrap());
        assert!(reader.finish().is_ok());
    }

    #[test]
    fn test_param_reader_rejects_leftovers() {
        let mut params = ExtraParams::new();
        params.insert("domain_id".to_string(), json!("d"));
        let err = ParamReader::new("v2 password", params).finish().unwrap_err();
        assert!(err.to_string().contains("unexpected parameters: domain_id"));
    }

    #[test]
    fn test_param_reader_rejects_wrong_types() {
        let mut params = ExtraParams::new();
        params.insert("trust_id".to_string(), json!(42));
        params.insert("reauthenticate".to_string(), json!("yes"));
        let mut reader = ParamReader::new("test", params);
        assert!(reader.string("trust_id").is_err());
        assert!(reader.boolean("reauthenticate", true).is_err());
    }
}
