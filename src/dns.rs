//! DNS TXT fallback for the identity endpoint
//!
//! When no `auth-url` is configured, the loaders ask DNS for a TXT record
//! under a well-known name and use its single string as the endpoint. Every
//! failure mode (no resolver, NXDOMAIN, no answer, timeout, resolver error,
//! zero or several candidates) collapses into "no endpoint discovered"; the
//! caller then fails with a missing `auth-url` instead.
//!
//! The system resolver is backed by `hickory-resolver` and is only compiled
//! with the `dns` feature. Without it [`system_resolver`] returns `None`.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Record name queried for the endpoint
pub const DNS_NAME: &str = "_openstack_keystone";

/// Lookup outcomes a [`TxtResolver`] can report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DnsError {
    /// The name exists but carries no TXT records
    #[error("no TXT answer")]
    NoAnswer,
    /// The name does not exist
    #[error("domain does not exist")]
    NxDomain,
    /// The query timed out
    #[error("query timed out")]
    Timeout,
    /// Any other resolver failure
    #[error("{0}")]
    Resolver(String),
}

/// Minimal TXT query contract
#[async_trait]
pub trait TxtResolver: Send + Sync + std::fmt::Debug {
    /// Returns every string of every TXT record found for `name`
    async fn query_txt(&self, name: &str) -> Result<Vec<String>, DnsError>;
}

/// Resolves the endpoint, falling back to DNS when none was given
///
/// An explicit, non-empty endpoint is returned unchanged without touching
/// the resolver. This function never fails.
///
/// # Examples
///
/// ```
/// use kgauth::dns::{resolve_endpoint, StaticTxtResolver};
///
/// # #[tokio::main]
/// # async fn main() {
/// let dns = StaticTxtResolver::records(vec!["https://id.example.com".to_string()]);
/// let url = resolve_endpoint(None, Some(&dns)).await;
/// assert_eq!(url.as_deref(), Some("https://id.example.com"));
/// # }
/// ```
pub async fn resolve_endpoint(
    explicit: Option<&str>,
    resolver: Option<&dyn TxtResolver>,
) -> Option<String> {
    if let Some(url) = explicit.filter(|u| !u.is_empty()) {
        return Some(url.to_string());
    }

    let Some(resolver) = resolver else {
        tracing::debug!("Skipping DNS lookup as no DNS resolver is available");
        return None;
    };

    let urls = match resolver.query_txt(DNS_NAME).await {
        Ok(urls) => urls,
        Err(DnsError::NoAnswer | DnsError::NxDomain) => {
            tracing::debug!("No authentication URL discovered from DNS");
            return None;
        }
        Err(DnsError::Timeout) => {
            tracing::warn!("Timed out trying to discover URL from DNS");
            return None;
        }
        Err(DnsError::Resolver(e)) => {
            tracing::warn!(error = %e, "Unexpected DNS error");
            return None;
        }
    };

    match urls.as_slice() {
        [] => {
            tracing::debug!("DNS answer carried no TXT strings");
            None
        }
        [url] => {
            tracing::debug!(url = %url, "Using auth url from DNS");
            Some(url.clone())
        }
        _ => {
            tracing::warn!(
                candidates = urls.len(),
                "Found multiple options for URL from DNS. Ignoring all of them rather than picking one."
            );
            None
        }
    }
}

/// Resolver that answers every query with a fixed outcome
///
/// Useful for tests and for callers that already know the TXT answer.
#[derive(Debug, Clone)]
pub struct StaticTxtResolver {
    answer: Result<Vec<String>, DnsError>,
}

impl StaticTxtResolver {
    /// Answers with the given strings
    pub fn records(records: Vec<String>) -> Self {
        Self {
            answer: Ok(records),
        }
    }

    /// Answers with the given error
    pub fn failing(error: DnsError) -> Self {
        Self { answer: Err(error) }
    }
}

#[async_trait]
impl TxtResolver for StaticTxtResolver {
    async fn query_txt(&self, _name: &str) -> Result<Vec<String>, DnsError> {
        self.answer.clone()
    }
}

#[cfg(feature = "dns")]
mod system {
    use async_trait::async_trait;
    use hickory_resolver::error::{ResolveError, ResolveErrorKind};
    use hickory_resolver::proto::op::ResponseCode;
    use hickory_resolver::TokioAsyncResolver;

    use super::{DnsError, TxtResolver};

    /// Resolver using the host's DNS configuration
    #[derive(Clone)]
    pub struct SystemTxtResolver {
        inner: TokioAsyncResolver,
    }

    impl std::fmt::Debug for SystemTxtResolver {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("SystemTxtResolver").finish_non_exhaustive()
        }
    }

    impl SystemTxtResolver {
        /// Builds a resolver from the system configuration, `None` if unusable
        pub fn from_system_conf() -> Option<Self> {
            match TokioAsyncResolver::tokio_from_system_conf() {
                Ok(inner) => Some(Self { inner }),
                Err(e) => {
                    tracing::debug!(error = %e, "System DNS configuration unavailable");
                    None
                }
            }
        }
    }

    fn classify(err: &ResolveError) -> DnsError {
        match err.kind() {
            ResolveErrorKind::NoRecordsFound { response_code, .. }
                if *response_code == ResponseCode::NXDomain =>
            {
                DnsError::NxDomain
            }
            ResolveErrorKind::NoRecordsFound { .. } => DnsError::NoAnswer,
            ResolveErrorKind::Timeout => DnsError::Timeout,
            _ => DnsError::Resolver(err.to_string()),
        }
    }

    #[async_trait]
    impl TxtResolver for SystemTxtResolver {
        async fn query_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
            let lookup = self
                .inner
                .txt_lookup(name)
                .await
                .map_err(|e| classify(&e))?;

            Ok(lookup
                .iter()
                .flat_map(|txt| {
                    txt.txt_data()
                        .iter()
                        .map(|data| String::from_utf8_lossy(data).into_owned())
                })
                .collect())
        }
    }
}

#[cfg(feature = "dns")]
pub use system::SystemTxtResolver;

/// The host resolver, or `None` when DNS support is unavailable
pub fn system_resolver() -> Option<Arc<dyn TxtResolver>> {
    #[cfg(feature = "dns")]
    {
        SystemTxtResolver::from_system_conf().map(|r| Arc::new(r) as Arc<dyn TxtResolver>)
    }

    #[cfg(not(feature = "dns"))]
    {
        tracing::debug!("Skipping DNS lookup as DNS support is not compiled in");
        None
    }
}
