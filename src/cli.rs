//! Command-line interface definition for kgauth
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands to inspect options, resolve configuration and run
//! identity version discovery.

use clap::{Parser, Subcommand};

/// kgauth - version-agnostic identity authentication front end
///
/// Resolves identity options from configuration and environment, finds the
/// endpoint (falling back to DNS) and selects the v2 or v3 plugin the
/// endpoint supports.
#[derive(Parser, Debug, Clone)]
#[command(name = "kgauth")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/kgauth.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for kgauth
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List the options a loader accepts
    Options {
        /// Loader to describe (password, token); defaults to the configured one
        #[arg(short, long)]
        auth_type: Option<String>,
    },

    /// Show resolved options and the endpoint, secrets masked
    Resolve,

    /// Discover the endpoint's versions and show the selected plugin
    Discover {
        /// Output the selected plugin as JSON
        #[arg(short, long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/kgauth.yaml".to_string()),
            verbose: false,
            command: Commands::Resolve,
        }
    }
}
