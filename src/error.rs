//! Error types for KGAuth
//!
//! This module defines the error types raised while loading options,
//! discovering identity API versions and constructing versioned plugins,
//! using `thiserror` for ergonomic error handling.
//!
//! Soft DNS misses never appear here: the endpoint resolver absorbs them and
//! reports "no endpoint" instead.

use thiserror::Error;

/// Main error type for KGAuth operations
///
/// Callers that need to tell failure kinds apart downcast the
/// [`anyhow::Error`] carried by [`Result`] to this enum.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Illegal option or credential combination, invalid registry or config
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Required options absent after alias resolution and DNS fallback
    #[error("Missing required options: {}", .0.join(", "))]
    MissingOptions(Vec<String>),

    /// No usable identity API version could be found at the endpoint
    #[error("Discovery failure: {0}")]
    DiscoveryFailure(String),

    /// Loader name not known to the plugin factory
    #[error("Unknown plugin type: {0}")]
    UnknownPluginType(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing errors
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl AuthError {
    /// Returns true for errors caused by an illegal configuration
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::MissingOptions(_))
    }

    /// Returns true for errors raised while discovering API versions
    pub fn is_discovery_failure(&self) -> bool {
        matches!(self, Self::DiscoveryFailure(_))
    }
}

/// Result type alias for KGAuth operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_display() {
        let error = AuthError::Configuration("bad combination".to_string());
        assert_eq!(error.to_string(), "Configuration error: bad combination");
    }

    #[test]
    fn test_missing_options_error_display() {
        let error = AuthError::MissingOptions(vec!["auth-url".to_string(), "token".to_string()]);
        assert_eq!(
            error.to_string(),
            "Missing required options: auth-url, token"
        );
    }

    #[test]
    fn test_discovery_failure_display() {
        let error = AuthError::DiscoveryFailure("no versions".to_string());
        assert_eq!(error.to_string(), "Discovery failure: no versions");
    }

    #[test]
    fn test_unknown_plugin_type_display() {
        let error = AuthError::UnknownPluginType("saml".to_string());
        assert_eq!(error.to_string(), "Unknown plugin type: saml");
    }

    #[test]
    fn test_kind_predicates() {
        assert!(AuthError::Configuration(String::new()).is_configuration());
        assert!(AuthError::MissingOptions(vec![]).is_configuration());
        assert!(!AuthError::DiscoveryFailure(String::new()).is_configuration());
        assert!(AuthError::DiscoveryFailure(String::new()).is_discovery_failure());
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = AuthError::Configuration("x".to_string()).into();
        let auth = err.downcast_ref::<AuthError>().unwrap();
        assert!(auth.is_configuration());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: AuthError = io_error.into();
        assert!(matches!(error, AuthError::Io(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_str = "invalid: : yaml";
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let error: AuthError = yaml_error.into();
        assert!(matches!(error, AuthError::Yaml(_)));
    }

    #[test]
    fn test_url_error_conversion() {
        let url_error = url::Url::parse("not a url").unwrap_err();
        let error: AuthError = url_error.into();
        assert!(matches!(error, AuthError::Url(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AuthError>();
    }
}
