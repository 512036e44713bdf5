//! kgauth - version-agnostic identity authentication front end
//!
#![doc = "kgauth - version-agnostic identity authentication front end"]
#![doc = "Main entry point for the kgauth command-line tool."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kgauth::cli::{Cli, Commands};
use kgauth::commands;
use kgauth::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/kgauth.yaml");
    let config = Config::load(config_path)?;

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Options { auth_type } => {
            tracing::debug!("Listing options");
            commands::options::list_options(&config, auth_type.as_deref())?;
            Ok(())
        }
        Commands::Resolve => {
            tracing::info!("Resolving {} options", config.auth_type);
            commands::resolve::show_resolved(&config).await?;
            Ok(())
        }
        Commands::Discover { json } => {
            tracing::info!("Starting identity version discovery");
            commands::discover::run_discover(&config, json).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so command output stays machine readable.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "kgauth=debug" } else { "kgauth=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
