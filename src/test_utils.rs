//! Test utilities for kgauth
//!
//! This module provides common test utilities: configuration fixtures,
//! discovery answers and assertion helpers for [`AuthError`] kinds.

use crate::discover::VersionData;
use crate::error::AuthError;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Discovery answer of an endpoint serving both v2.0 and v3.14, oldest first
pub fn identity_versions() -> Vec<VersionData> {
    vec![
        VersionData::new("v2.0", "https://id.example.com/v2.0/").expect("valid v2 entry"),
        VersionData::new("v3.14", "https://id.example.com/v3/").expect("valid v3 entry"),
    ]
}

/// Assert that a result failed with an [`AuthError`] matching `check`
///
/// # Panics
///
/// Panics if the result is Ok, the error is not an [`AuthError`], or
/// `check` rejects it
pub fn assert_auth_error<T>(result: crate::error::Result<T>, check: impl Fn(&AuthError) -> bool) {
    match result {
        Ok(_) => panic!("Expected an authentication error but got Ok"),
        Err(e) => match e.downcast_ref::<AuthError>() {
            Some(auth) => assert!(check(auth), "Unexpected error kind: {}", auth),
            None => panic!("Expected AuthError, got: {}", e),
        },
    }
}

/// Create a test configuration YAML string
pub fn test_config_yaml() -> String {
    r#"
auth_type: password
auth:
  auth-url: https://id.example.com
  username: alice
  password: secret
  tenant-name: demo
discovery:
  timeout_seconds: 5
  dns_fallback: false
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        assert!(path.exists());
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "content");
    }

    #[test]
    fn test_identity_versions_are_ordered() {
        let versions = identity_versions();
        assert!(versions[0].version < versions[1].version);
    }

    #[test]
    fn test_assert_auth_error_success() {
        let result: crate::error::Result<()> =
            Err(AuthError::Configuration("bad".to_string()).into());
        assert_auth_error(result, AuthError::is_configuration);
    }

    #[test]
    #[should_panic(expected = "but got Ok")]
    fn test_assert_auth_error_ok() {
        assert_auth_error(Ok(()), AuthError::is_configuration);
    }

    #[test]
    #[should_panic(expected = "Unexpected error kind")]
    fn test_assert_auth_error_wrong_kind() {
        let result: crate::error::Result<()> =
            Err(AuthError::DiscoveryFailure("none".to_string()).into());
        assert_auth_error(result, AuthError::is_configuration);
    }

    #[test]
    fn test_test_config_yaml() {
        let config: Config = serde_yaml::from_str(&test_config_yaml()).unwrap();
        assert_eq!(config.auth_type, "password");
        assert_eq!(config.auth.len(), 4);
        assert!(!config.discovery.dns_fallback);
        assert!(config.validate().is_ok());
    }
}
