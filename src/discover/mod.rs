//! Identity API version discovery and matching
//!
//! An identity endpoint advertises the API versions it serves. This module
//! holds the version vocabulary shared by the rest of the crate:
//!
//! - [`ApiVersion`]      -- numeric version identifier (`v3.14` -> `[3, 14]`)
//! - [`version_match`]   -- structural prefix comparison
//! - [`VersionFamily`]   -- the closed set of families the dispatcher knows
//! - [`VersionData`]     -- one entry of a discovery answer
//! - [`VersionDiscovery`] -- the query contract implemented by
//!   [`http::HttpVersionDiscovery`] and [`fake::StaticVersionDiscovery`]

pub mod fake;
pub mod http;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Serialize, Serializer};
use url::Url;

use crate::error::{AuthError, Result};

pub use fake::StaticVersionDiscovery;
pub use http::HttpVersionDiscovery;

/// Numeric API version identifier
///
/// # Examples
///
/// ```
/// use kgauth::discover::ApiVersion;
///
/// let v: ApiVersion = "v3.14".parse().unwrap();
/// assert_eq!(v.components(), &[3, 14]);
/// assert_eq!(v.to_string(), "3.14");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion(Vec<u64>);

impl ApiVersion {
    /// Builds a version from its components
    pub fn new(components: &[u64]) -> Self {
        Self(components.to_vec())
    }

    /// Numeric components, most significant first
    pub fn components(&self) -> &[u64] {
        &self.0
    }

    /// Leading component, if any
    pub fn major(&self) -> Option<u64> {
        self.0.first().copied()
    }
}

impl FromStr for ApiVersion {
    type Err = AuthError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        let components = digits
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| AuthError::DiscoveryFailure(format!("invalid version identifier: {s}")))?;

        Ok(Self(components))
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u64::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

impl Serialize for ApiVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<&[u64]> for ApiVersion {
    fn from(components: &[u64]) -> Self {
        Self::new(components)
    }
}

/// Returns true when `candidate` starts with the `required` components
///
/// # Examples
///
/// ```
/// use kgauth::discover::{version_match, ApiVersion};
///
/// assert!(version_match(&[2], &ApiVersion::new(&[2, 0])));
/// assert!(!version_match(&[3], &ApiVersion::new(&[2, 0])));
/// ```
pub fn version_match(required: &[u64], candidate: &ApiVersion) -> bool {
    candidate.components().starts_with(required)
}

/// Version families the dispatcher can construct plugins for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionFamily {
    /// Identity API 2.x
    V2,
    /// Identity API 3.x
    V3,
}

impl VersionFamily {
    /// All families, oldest first
    pub const ALL: [VersionFamily; 2] = [VersionFamily::V2, VersionFamily::V3];

    /// Leading components shared by every version of the family
    pub fn prefix(self) -> &'static [u64] {
        match self {
            Self::V2 => &[2],
            Self::V3 => &[3],
        }
    }

    /// Returns true when `version` belongs to this family
    pub fn matches(self, version: &ApiVersion) -> bool {
        version_match(self.prefix(), version)
    }

    /// Family of `version`, if it belongs to one
    pub fn of(version: &ApiVersion) -> Option<Self> {
        Self::ALL.into_iter().find(|family| family.matches(version))
    }
}

impl fmt::Display for VersionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V2 => write!(f, "v2"),
            Self::V3 => write!(f, "v3"),
        }
    }
}

/// One version advertised by an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionData {
    /// Advertised version
    pub version: ApiVersion,
    /// URL serving that version
    pub url: Url,
    /// Advertised status (`stable`, `deprecated`, ...), empty if unknown
    pub status: String,
}

impl VersionData {
    /// Convenience constructor parsing both the version and the URL
    pub fn new(version: &str, url: &str) -> Result<Self> {
        Ok(Self {
            version: version.parse()?,
            url: Url::parse(url)?,
            status: String::new(),
        })
    }
}

/// Queries an endpoint for the versions it supports
///
/// Implementations return entries ordered oldest to newest and fail with
/// [`AuthError::DiscoveryFailure`] when the endpoint is unreachable or
/// advertises nothing recognizable.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VersionDiscovery: Send + Sync {
    /// Returns the versions served at `url`
    async fn discover(&self, url: &Url) -> Result<Vec<VersionData>>;
}
