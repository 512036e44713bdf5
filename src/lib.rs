//! kgauth - version-agnostic identity authentication front end
//!
//! Callers supply credentials without knowing whether the identity service
//! speaks API v2 or v3. The library resolves options (including deprecated
//! aliases), finds the endpoint (falling back to a DNS TXT lookup), and on
//! first use discovers the versions the endpoint serves and builds the
//! matching concrete plugin.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `options`: Option declarations and deprecated-alias resolution
//! - `dns`: DNS TXT endpoint fallback
//! - `discover`: API versions, family matching and version discovery
//! - `plugins`: Concrete v2/v3 credential plugins
//! - `generic`: The version-agnostic dispatcher
//! - `loading`: Named loaders producing ready generic plugins
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use kgauth::discover::HttpVersionDiscovery;
//! use kgauth::dns::system_resolver;
//! use kgauth::loading::get_plugin_loader;
//! use kgauth::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("kgauth.yaml")?;
//!     config.validate()?;
//!
//!     let loader = get_plugin_loader(&config.auth_type)?;
//!     let discovery = Arc::new(HttpVersionDiscovery::new(config.discovery.timeout())?);
//!     let resolver = system_resolver();
//!     let plugin = loader
//!         .load_from_options(&config.auth, resolver.as_deref(), discovery)
//!         .await?;
//!
//!     let concrete = plugin.get_plugin().await?;
//!     println!("using {} at {}", concrete.family(), concrete.auth_url());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod discover;
pub mod dns;
pub mod error;
pub mod generic;
pub mod loading;
pub mod options;
pub mod plugins;

// Re-export commonly used types
pub use config::Config;
pub use error::{AuthError, Result};
pub use generic::GenericPlugin;
pub use loading::{get_plugin_loader, Loader};
pub use plugins::VersionedPlugin;

#[cfg(test)]
pub mod test_utils;
