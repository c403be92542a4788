//! Command-line interface definition for craftwatch-updater.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Loader;

/// Minecraft mod updater -- checks Modrinth for newer compatible
/// versions of every jar in a mods directory and swaps them in place.
#[derive(Debug, Parser)]
#[command(name = "craftwatch-updater", version, about)]
pub struct UpdaterCli {
    /// Path to the mods directory
    #[arg(long)]
    pub mods_dir: Option<PathBuf>,

    /// Minecraft version (e.g. 1.20.1)
    #[arg(long)]
    pub game_version: Option<String>,

    /// Mod loader
    #[arg(long, value_enum)]
    pub loader: Option<Loader>,

    /// Path to a TOML config file used as fallback for missing args
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Path to a JSON file mapping inferred slugs to real project slugs
    #[arg(long)]
    pub slug_overrides: Option<PathBuf>,

    /// Slack webhook URL for a run summary (optional)
    #[arg(long)]
    pub slack_webhook_url: Option<String>,

    /// Log level filter
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Check for updates without downloading or replacing files
    #[arg(long)]
    pub dry_run: bool,
}
