//! In-memory [`VersionDiscovery`] for tests and offline use
//!
//! [`StaticVersionDiscovery`] answers every query with a fixed version list
//! (or a fixed failure) and counts how often it was asked, so tests can
//! assert that discovery ran exactly once.
//!
//! # Example
//!
//! ```
//! use kgauth::discover::{StaticVersionDiscovery, VersionData, VersionDiscovery};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let fake = StaticVersionDiscovery::new(vec![
//!     VersionData::new("v3.14", "https://id.example.com/v3/").unwrap(),
//! ]);
//! let url = url::Url::parse("https://id.example.com").unwrap();
//! let versions = fake.discover(&url).await.unwrap();
//! assert_eq!(versions.len(), 1);
//! assert_eq!(fake.calls(), 1);
//! # }
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::{VersionData, VersionDiscovery};
use crate::error::{AuthError, Result};

/// Discovery fake answering with a fixed outcome
#[derive(Debug)]
pub struct StaticVersionDiscovery {
    answer: std::result::Result<Vec<VersionData>, String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticVersionDiscovery {
    /// Answers with `versions`
    pub fn new(versions: Vec<VersionData>) -> Self {
        Self {
            answer: Ok(versions),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails every query with a discovery failure carrying `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            answer: Err(message.into()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleeps for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of queries received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VersionDiscovery for StaticVersionDiscovery {
    async fn discover(&self, _url: &Url) -> Result<Vec<VersionData>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.answer {
            Ok(versions) => Ok(versions.clone()),
            Err(message) => Err(AuthError::DiscoveryFailure(message.clone()).into()),
        }
    }
}
