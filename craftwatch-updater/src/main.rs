//! craftwatch-updater entry point.
//!
//! Resolves settings from CLI arguments and the optional config file,
//! runs the update loop, optionally posts a Slack summary, and maps the
//! outcome to a process exit code (0 = ok, 1 = partial failure,
//! 2 = fatal configuration error).

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use craftwatch_updater::cli::UpdaterCli;
use craftwatch_updater::config::resolve_settings;
use craftwatch_updater::error::UpdaterError;
use craftwatch_updater::updater::{ModUpdater, UpdateReport, send_slack_summary};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = UpdaterCli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(&cli).await {
        Ok(report) => ExitCode::from(report.exit_code()),
        Err(e) => {
            tracing::error!(error = %e, "updater failed");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: &UpdaterCli) -> Result<UpdateReport, UpdaterError> {
    let settings = resolve_settings(cli)?;
    tracing::info!(
        mods_dir = %settings.mods_dir.display(),
        game_version = %settings.game_version,
        loader = %settings.loader,
        dry_run = settings.dry_run,
        "craftwatch-updater starting"
    );

    let slack_webhook_url = settings.slack_webhook_url.clone();
    let updater = ModUpdater::new(settings)?;
    let report = updater.run().await?;

    tracing::info!(
        updated = report.updated.len(),
        unchanged = report.unchanged,
        failed = report.failed.len(),
        "update run complete"
    );

    if let Some(url) = slack_webhook_url {
        send_slack_summary(&url, &report).await;
    }

    Ok(report)
}
