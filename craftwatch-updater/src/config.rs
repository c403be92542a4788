//! Settings resolution: CLI arguments with TOML config file fallback.
//!
//! CLI arguments always win. A config file only fills in settings the
//! command line left unset. `mods_dir`, `game_version`, and `loader`
//! are required; any missing after resolution is a fatal error.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cli::UpdaterCli;
use crate::error::UpdaterError;

/// Supported mod loaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Loader {
    /// Fabric loader
    Fabric,
    /// Forge loader
    Forge,
}

impl Loader {
    /// Loader name as the Modrinth API expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fabric => "fabric",
            Self::Forge => "forge",
        }
    }
}

impl fmt::Display for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional TOML config file contents.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    mods_dir: Option<PathBuf>,
    game_version: Option<String>,
    loader: Option<Loader>,
    slug_overrides: Option<PathBuf>,
    slack_webhook_url: Option<String>,
}

/// Fully resolved updater settings.
#[derive(Debug, Clone)]
pub struct UpdaterSettings {
    /// Directory containing the mod jars to update.
    pub mods_dir: PathBuf,
    /// Minecraft version the mods must be compatible with.
    pub game_version: String,
    /// Mod loader the mods must be compatible with.
    pub loader: Loader,
    /// Filename-inferred slug -> real Modrinth project slug.
    pub slug_overrides: HashMap<String, String>,
    /// Slack webhook URL for the run summary, if configured.
    pub slack_webhook_url: Option<String>,
    /// Check only, never download or replace.
    pub dry_run: bool,
}

/// Merge CLI arguments with the optional config file.
pub fn resolve_settings(cli: &UpdaterCli) -> Result<UpdaterSettings, UpdaterError> {
    let file = match &cli.config {
        Some(path) => load_file_config(path)?,
        None => FileConfig::default(),
    };

    let mods_dir = cli.mods_dir.clone().or(file.mods_dir);
    let game_version = cli.game_version.clone().or(file.game_version);
    let loader = cli.loader.or(file.loader);

    let mut missing = Vec::new();
    if mods_dir.is_none() {
        missing.push("mods_dir");
    }
    if game_version.is_none() {
        missing.push("game_version");
    }
    if loader.is_none() {
        missing.push("loader");
    }
    if !missing.is_empty() {
        return Err(UpdaterError::Config(format!(
            "missing required settings: {}",
            missing.join(", ")
        )));
    }

    let overrides_path = cli.slug_overrides.clone().or(file.slug_overrides);
    let slug_overrides = match overrides_path {
        Some(path) => load_slug_overrides(&path)?,
        None => HashMap::new(),
    };

    Ok(UpdaterSettings {
        mods_dir: mods_dir.unwrap_or_default(),
        game_version: game_version.unwrap_or_default(),
        loader: loader.unwrap_or(Loader::Fabric),
        slug_overrides,
        slack_webhook_url: cli.slack_webhook_url.clone().or(file.slack_webhook_url),
        dry_run: cli.dry_run,
    })
}

fn load_file_config(path: &Path) -> Result<FileConfig, UpdaterError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        UpdaterError::Config(format!("cannot read config file {}: {}", path.display(), e))
    })?;
    toml::from_str(&content).map_err(|e| {
        UpdaterError::Config(format!("cannot parse config file {}: {}", path.display(), e))
    })
}

fn load_slug_overrides(path: &Path) -> Result<HashMap<String, String>, UpdaterError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        UpdaterError::Config(format!(
            "cannot read slug overrides {}: {}",
            path.display(),
            e
        ))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        UpdaterError::Config(format!(
            "cannot parse slug overrides {}: {}",
            path.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> UpdaterCli {
        let mut full = vec!["craftwatch-updater"];
        full.extend_from_slice(args);
        UpdaterCli::parse_from(full)
    }

    #[test]
    fn cli_args_alone_are_sufficient() {
        let settings = resolve_settings(&cli(&[
            "--mods-dir",
            "/srv/mods",
            "--game-version",
            "1.20.1",
            "--loader",
            "forge",
        ]))
        .unwrap();
        assert_eq!(settings.mods_dir, PathBuf::from("/srv/mods"));
        assert_eq!(settings.game_version, "1.20.1");
        assert_eq!(settings.loader, Loader::Forge);
        assert!(settings.slug_overrides.is_empty());
        assert!(settings.slack_webhook_url.is_none());
    }

    #[test]
    fn missing_settings_listed_in_error() {
        let err = resolve_settings(&cli(&["--mods-dir", "/srv/mods"])).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("game_version"));
        assert!(message.contains("loader"));
        assert!(!message.contains("mods_dir,"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn config_file_fills_missing_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("updater.toml");
        std::fs::write(
            &config_path,
            "mods_dir = \"/srv/mods\"\ngame_version = \"1.20.1\"\nloader = \"fabric\"\n",
        )
        .unwrap();

        let settings =
            resolve_settings(&cli(&["--config", config_path.to_str().unwrap()])).unwrap();
        assert_eq!(settings.loader, Loader::Fabric);
        assert_eq!(settings.game_version, "1.20.1");
    }

    #[test]
    fn cli_args_override_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("updater.toml");
        std::fs::write(
            &config_path,
            "mods_dir = \"/other\"\ngame_version = \"1.19.4\"\nloader = \"forge\"\n",
        )
        .unwrap();

        let settings = resolve_settings(&cli(&[
            "--config",
            config_path.to_str().unwrap(),
            "--game-version",
            "1.20.1",
        ]))
        .unwrap();
        assert_eq!(settings.game_version, "1.20.1");
        assert_eq!(settings.mods_dir, PathBuf::from("/other"));
    }

    #[test]
    fn unreadable_config_file_is_fatal() {
        let err = resolve_settings(&cli(&["--config", "/nonexistent/updater.toml"])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn slug_overrides_loaded_from_json() {
        let tmp = tempfile::tempdir().unwrap();
        let overrides_path = tmp.path().join("mod_slugs.json");
        std::fs::write(&overrides_path, r#"{"voicechat": "simple-voice-chat"}"#).unwrap();

        let settings = resolve_settings(&cli(&[
            "--mods-dir",
            "/srv/mods",
            "--game-version",
            "1.20.1",
            "--loader",
            "fabric",
            "--slug-overrides",
            overrides_path.to_str().unwrap(),
        ]))
        .unwrap();
        assert_eq!(
            settings.slug_overrides.get("voicechat").map(String::as_str),
            Some("simple-voice-chat")
        );
    }

    #[test]
    fn malformed_overrides_file_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let overrides_path = tmp.path().join("mod_slugs.json");
        std::fs::write(&overrides_path, "{broken").unwrap();

        let err = resolve_settings(&cli(&[
            "--mods-dir",
            "/srv/mods",
            "--game-version",
            "1.20.1",
            "--loader",
            "fabric",
            "--slug-overrides",
            overrides_path.to_str().unwrap(),
        ]))
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
