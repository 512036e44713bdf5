//! Version discovery over HTTP
//!
//! Issues a `GET` against the identity endpoint and reads the version
//! document it returns. Identity services answer the unversioned root with
//! `300 Multiple Choices` and a version list, and a versioned URL with
//! `200 OK` and a single version. All three document shapes seen in the wild
//! are accepted:
//!
//! ```text
//! {"versions": {"values": [{"id": "v3.14", "status": "stable", "links": [...]}]}}
//! {"versions": [{"id": "v2.0", ...}]}
//! {"version": {"id": "v3.14", ...}}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use super::{ApiVersion, VersionData, VersionDiscovery};
use crate::error::{AuthError, Result};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VersionDocument {
    Many { versions: VersionList },
    Single { version: RawVersion },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VersionList {
    Values { values: Vec<RawVersion> },
    Plain(Vec<RawVersion>),
}

#[derive(Debug, Deserialize)]
struct RawVersion {
    id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    links: Vec<RawLink>,
}

#[derive(Debug, Deserialize)]
struct RawLink {
    #[serde(default)]
    rel: String,
    href: String,
}

/// [`VersionDiscovery`] backed by a [`reqwest::Client`]
#[derive(Debug, Clone)]
pub struct HttpVersionDiscovery {
    http: reqwest::Client,
}

impl HttpVersionDiscovery {
    /// Creates a discovery client whose requests time out after `timeout`
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AuthError::Http)?;
        Ok(Self { http })
    }

    /// Wraps an existing client
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

fn into_version_data(raw: RawVersion, fallback_url: &Url) -> Option<VersionData> {
    let version = match raw.id.parse::<ApiVersion>() {
        Ok(v) => v,
        Err(_) => {
            tracing::debug!(id = %raw.id, "Skipping version with unparsable id");
            return None;
        }
    };

    let url = match raw.links.iter().find(|l| l.rel == "self") {
        Some(link) => match Url::parse(&link.href) {
            Ok(u) => u,
            Err(e) => {
                tracing::debug!(href = %link.href, error = %e, "Skipping version with invalid self link");
                return None;
            }
        },
        None => fallback_url.clone(),
    };

    Some(VersionData {
        version,
        url,
        status: raw.status.to_lowercase(),
    })
}

fn parse_document(doc: VersionDocument, url: &Url) -> Vec<VersionData> {
    let raw = match doc {
        VersionDocument::Many {
            versions: VersionList::Values { values },
        } => values,
        VersionDocument::Many {
            versions: VersionList::Plain(values),
        } => values,
        VersionDocument::Single { version } => vec![version],
    };

    let mut versions: Vec<VersionData> = raw
        .into_iter()
        .filter_map(|r| into_version_data(r, url))
        .collect();
    versions.sort_by(|a, b| a.version.cmp(&b.version));
    versions
}

#[async_trait]
impl VersionDiscovery for HttpVersionDiscovery {
    async fn discover(&self, url: &Url) -> Result<Vec<VersionData>> {
        tracing::debug!(url = %url, "Querying identity versions");

        let resp = self
            .http
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AuthError::DiscoveryFailure(format!("failed to contact {url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() && status != StatusCode::MULTIPLE_CHOICES {
            return Err(
                AuthError::DiscoveryFailure(format!("{url} returned {status}")).into(),
            );
        }

        let doc: VersionDocument = resp.json().await.map_err(|e| {
            AuthError::DiscoveryFailure(format!("invalid version document from {url}: {e}"))
        })?;

        let versions = parse_document(doc, url);
        if versions.is_empty() {
            return Err(AuthError::DiscoveryFailure(format!(
                "no recognizable versions advertised by {url}"
            ))
            .into());
        }

        tracing::debug!(
            url = %url,
            versions = ?versions.iter().map(|v| v.version.to_string()).collect::<Vec<_>>(),
            "Discovered identity versions"
        );
        Ok(versions)
    }
}
