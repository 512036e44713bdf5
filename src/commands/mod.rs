/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `options`  - Describe the options a loader accepts
- `resolve`  - Show resolved options and the endpoint
- `discover` - Run version discovery and show the selected plugin
*/

use crate::config::Config;
use crate::discover::{HttpVersionDiscovery, VersionDiscovery};
use crate::dns::{system_resolver, TxtResolver};
use crate::error::{AuthError, Result};
use crate::loading::{get_plugin_loader, Loader};
use crate::options::OptionSpec;
use crate::plugins::VersionedPlugin;
use colored::Colorize;
use prettytable::{cell, row, Table};
use std::sync::Arc;

/// Loader named on the command line, falling back to the configured one
fn select_loader(config: &Config, auth_type: Option<&str>) -> Result<Box<dyn Loader>> {
    get_plugin_loader(auth_type.unwrap_or(&config.auth_type))
}

/// DNS resolver to use for the endpoint fallback, if enabled and available
fn dns_resolver(config: &Config) -> Option<Arc<dyn TxtResolver>> {
    if config.discovery.dns_fallback {
        system_resolver()
    } else {
        tracing::debug!("DNS fallback disabled by configuration");
        None
    }
}

pub mod options {
    use super::*;

    /// Print the option table of a loader
    ///
    /// # Arguments
    ///
    /// * `config` - Loaded configuration, supplies the default auth type
    /// * `auth_type` - Loader override
    ///
    /// # Errors
    ///
    /// Returns error if the loader name is unknown.
    pub fn list_options(config: &Config, auth_type: Option<&str>) -> Result<()> {
        let loader = select_loader(config, auth_type)?;
        let specs = loader.get_options();

        println!("\nOptions for the {} loader:\n", loader.name().bold());
        options_table(&specs).printstd();
        println!();
        Ok(())
    }

    pub(crate) fn options_table(specs: &[OptionSpec]) -> Table {
        let mut table = Table::new();
        table.add_row(row!["Option", "Deprecated", "Environment", "Flags", "Help"]);

        for spec in specs {
            let deprecated = if spec.deprecated.is_empty() {
                "-".to_string()
            } else {
                spec.deprecated.join(", ")
            };

            table.add_row(row![
                spec.name,
                deprecated,
                spec.env_vars().join(", "),
                format_flags(spec),
                spec.help
            ]);
        }

        table
    }

    pub(crate) fn format_flags(spec: &OptionSpec) -> String {
        let mut flags = Vec::new();
        if spec.required {
            flags.push("required");
        }
        if spec.secret {
            flags.push("secret");
        }
        if flags.is_empty() {
            "-".to_string()
        } else {
            flags.join(", ")
        }
    }
}

pub mod resolve {
    use super::*;

    /// Print the resolved options with secrets masked
    ///
    /// # Errors
    ///
    /// Returns error if the loader is unknown or required options are
    /// missing after the DNS fallback.
    pub async fn show_resolved(config: &Config) -> Result<()> {
        let loader = select_loader(config, None)?;
        let resolver = dns_resolver(config);

        let options = loader
            .resolve_options(&config.auth, resolver.as_deref())
            .await?;
        let masked = loader.registry()?.masked(&options);

        println!("\nResolved {} options:\n", loader.name().bold());
        for (name, value) in masked.as_map() {
            println!("  {:<22} {}", format!("{}:", name).cyan(), value);
        }

        if let Some(url) = options.get("auth-url") {
            println!("\n{} {}", "Endpoint:".bold(), url.green());
        }
        println!();
        Ok(())
    }
}

pub mod discover {
    use super::*;

    /// Load the configured credential and select its versioned plugin
    ///
    /// # Errors
    ///
    /// Returns error if loading fails or no usable version is found.
    pub async fn select_plugin(
        config: &Config,
        resolver: Option<&dyn TxtResolver>,
        discovery: Arc<dyn VersionDiscovery>,
    ) -> Result<VersionedPlugin> {
        let loader = select_loader(config, None)?;
        let plugin = loader
            .load_from_options(&config.auth, resolver, discovery)
            .await?;
        let selected = plugin.get_plugin().await?;
        Ok(selected.clone())
    }

    /// Run discovery against the configured endpoint and print the result
    ///
    /// # Arguments
    ///
    /// * `config` - Loaded configuration
    /// * `json` - Print the selected plugin as JSON instead of text
    ///
    /// # Errors
    ///
    /// Returns error if discovery fails or the output cannot be serialized.
    pub async fn run_discover(config: &Config, json: bool) -> Result<()> {
        let discovery = Arc::new(HttpVersionDiscovery::new(config.discovery.timeout())?);
        let resolver = dns_resolver(config);

        let plugin = select_plugin(config, resolver.as_deref(), discovery).await?;

        if json {
            let out = serde_json::to_string_pretty(&plugin).map_err(AuthError::Serialization)?;
            println!("{}", out);
        } else {
            println!(
                "\n{} identity {} at {}\n",
                "Selected".bold(),
                plugin.family().to_string().green(),
                plugin.auth_url()
            );
        }
        Ok(())
    }
}
