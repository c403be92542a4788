//! craftwatch-daemon entry point.
//!
//! Parses CLI arguments, loads configuration, initializes logging,
//! and hands control to the [`Orchestrator`].

use anyhow::Result;
use clap::Parser;

use craftwatch_core::config::CraftwatchConfig;
use craftwatch_daemon::cli::DaemonCli;
use craftwatch_daemon::logging;
use craftwatch_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    let mut config = CraftwatchConfig::load(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load {}: {}", cli.config.display(), e))?;

    // CLI overrides take precedence over file and env
    if let Some(level) = cli.log_level {
        config.general.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.general.log_format = format;
    }
    if let Some(pid_file) = cli.pid_file {
        config.general.pid_file = pid_file;
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    if cli.validate {
        println!("configuration OK: {}", cli.config.display());
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "craftwatch-daemon starting"
    );

    let mut orchestrator = Orchestrator::build_from_config(config)?;
    orchestrator.run().await?;

    tracing::info!("craftwatch-daemon shut down");
    Ok(())
}
