//! Update loop: scan the mods directory and bring each jar up to date.
//!
//! Per-mod failures are logged and counted but never abort the run; only
//! configuration problems (e.g. an unreadable mods directory) are fatal.

use std::path::{Path, PathBuf};

use craftwatch_core::event::NotifyEvent;
use craftwatch_core::types::{EventCategory, Notification};
use craftwatch_notify::{NotifySink, SlackSink};

use crate::config::UpdaterSettings;
use crate::error::UpdaterError;
use crate::modrinth::ModrinthClient;
use crate::slug::infer_slug;

/// Timeout for the optional Slack summary post.
const SLACK_TIMEOUT_SECS: u64 = 15;

/// Result of processing a single jar.
enum ModOutcome {
    /// A newer compatible version was installed (or would be, on dry run).
    Updated {
        old: String,
        new: String,
    },
    Unchanged,
}

/// Summary of a full update run.
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Replaced jars as `old -> new` strings.
    pub updated: Vec<String>,
    /// Jars already at the newest compatible version.
    pub unchanged: usize,
    /// Failed jars with their error messages.
    pub failed: Vec<(String, String)>,
}

impl UpdateReport {
    /// Process exit code: 0 when every mod succeeded, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.failed.is_empty() { 0 } else { 1 }
    }

    /// Human-readable multi-line run summary.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Mod update finished: {} updated, {} current, {} failed.",
            self.updated.len(),
            self.unchanged,
            self.failed.len()
        )];
        for update in &self.updated {
            lines.push(format!("⬆️ {}", update));
        }
        for (file, reason) in &self.failed {
            lines.push(format!("❌ {}: {}", file, reason));
        }
        lines.join("\n")
    }
}

/// Drives the update run for one mods directory.
pub struct ModUpdater {
    settings: UpdaterSettings,
    client: ModrinthClient,
}

impl ModUpdater {
    /// Create an updater against the production Modrinth API.
    pub fn new(settings: UpdaterSettings) -> Result<Self, UpdaterError> {
        Ok(Self {
            settings,
            client: ModrinthClient::new()?,
        })
    }

    /// Create an updater with a custom client (used in tests).
    #[cfg(test)]
    pub fn with_client(settings: UpdaterSettings, client: ModrinthClient) -> Self {
        Self { settings, client }
    }

    /// Process every `*.jar` in the mods directory.
    pub async fn run(&self) -> Result<UpdateReport, UpdaterError> {
        let jars = scan_jars(&self.settings.mods_dir)?;
        tracing::info!(
            mods_dir = %self.settings.mods_dir.display(),
            count = jars.len(),
            "scanning mods directory"
        );

        let mut report = UpdateReport::default();
        for jar in jars {
            let filename = jar
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            match self.update_mod(&jar, &filename).await {
                Ok(ModOutcome::Updated { old, new }) => {
                    report.updated.push(format!("{} -> {}", old, new));
                }
                Ok(ModOutcome::Unchanged) => {
                    report.unchanged += 1;
                }
                Err(e) => {
                    tracing::error!(file = %filename, error = %e, "mod update failed");
                    report.failed.push((filename, e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Check one jar against Modrinth and replace it when outdated.
    async fn update_mod(&self, path: &Path, filename: &str) -> Result<ModOutcome, UpdaterError> {
        let slug = infer_slug(filename, &self.settings.slug_overrides);
        tracing::debug!(file = %filename, slug = %slug, "resolving latest version");

        let latest = self
            .client
            .latest_compatible(&slug, &self.settings.game_version, self.settings.loader)
            .await?;
        // latest_compatible guarantees at least one file
        let file = latest.primary_file().ok_or_else(|| {
            UpdaterError::NoCompatibleVersion {
                slug: slug.clone(),
                game_version: self.settings.game_version.clone(),
                loader: self.settings.loader.as_str().to_owned(),
            }
        })?;

        if file.filename == filename {
            tracing::info!(file = %filename, "already at latest version");
            return Ok(ModOutcome::Unchanged);
        }

        if self.settings.dry_run {
            tracing::info!(
                old = %filename,
                new = %file.filename,
                "update available (dry run, skipping download)"
            );
            return Ok(ModOutcome::Updated {
                old: filename.to_owned(),
                new: file.filename.clone(),
            });
        }

        tracing::info!(old = %filename, new = %file.filename, "updating");
        let bytes = self.client.download(&file.url).await?;
        let new_path = self.settings.mods_dir.join(&file.filename);
        tokio::fs::write(&new_path, &bytes).await?;

        tracing::debug!(file = %filename, "deleting old jar");
        tokio::fs::remove_file(path).await?;

        Ok(ModOutcome::Updated {
            old: filename.to_owned(),
            new: file.filename.clone(),
        })
    }
}

/// List `*.jar` files in the mods directory, sorted by name.
fn scan_jars(mods_dir: &Path) -> Result<Vec<PathBuf>, UpdaterError> {
    let entries = std::fs::read_dir(mods_dir).map_err(|e| {
        UpdaterError::Config(format!(
            "cannot read mods directory {}: {}",
            mods_dir.display(),
            e
        ))
    })?;

    let mut jars = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "jar") {
            jars.push(path);
        }
    }
    jars.sort();
    Ok(jars)
}

/// Post the run summary to Slack. Failures are logged, never fatal.
pub async fn send_slack_summary(webhook_url: &str, report: &UpdateReport) {
    let category = if report.failed.is_empty() {
        EventCategory::ServerReady
    } else {
        EventCategory::ServerError
    };
    let event = NotifyEvent::new(Notification {
        server_name: "Mod Updater".to_owned(),
        message: report.summary(),
        category,
    });

    let sink = match SlackSink::new(webhook_url, SLACK_TIMEOUT_SECS) {
        Ok(sink) => sink,
        Err(e) => {
            tracing::warn!(error = %e, "cannot build slack sink for summary");
            return;
        }
    };
    if let Err(e) = sink.send(&event).await {
        tracing::warn!(error = %e, "slack summary delivery failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::config::Loader;

    fn settings(mods_dir: &Path) -> UpdaterSettings {
        UpdaterSettings {
            mods_dir: mods_dir.to_path_buf(),
            game_version: "1.20.1".to_owned(),
            loader: Loader::Fabric,
            slug_overrides: HashMap::new(),
            slack_webhook_url: None,
            dry_run: false,
        }
    }

    #[test]
    fn scan_finds_only_jar_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("sodium-0.5.8.jar"), b"jar").unwrap();
        std::fs::write(tmp.path().join("lithium-0.11.2.jar"), b"jar").unwrap();
        std::fs::write(tmp.path().join("readme.txt"), b"text").unwrap();
        std::fs::create_dir(tmp.path().join("backup.jar")).unwrap();

        let jars = scan_jars(tmp.path()).unwrap();
        let names: Vec<_> = jars
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["lithium-0.11.2.jar", "sodium-0.5.8.jar"]);
    }

    #[test]
    fn scan_missing_directory_is_fatal() {
        let err = scan_jars(Path::new("/nonexistent/mods")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn empty_mods_directory_reports_success() {
        let tmp = tempfile::tempdir().unwrap();
        let updater = ModUpdater::with_client(
            settings(tmp.path()),
            ModrinthClient::with_api_base("http://127.0.0.1:9").unwrap(),
        );

        let report = updater.run().await.unwrap();
        assert!(report.updated.is_empty());
        assert_eq!(report.unchanged, 0);
        assert!(report.failed.is_empty());
        assert_eq!(report.exit_code(), 0);
    }

    #[tokio::test]
    async fn api_failure_counts_mod_as_failed_and_continues() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("sodium-0.5.8.jar"), b"jar").unwrap();
        std::fs::write(tmp.path().join("lithium-0.11.2.jar"), b"jar").unwrap();

        let updater = ModUpdater::with_client(
            settings(tmp.path()),
            ModrinthClient::with_api_base("http://127.0.0.1:9").unwrap(),
        );

        let report = updater.run().await.unwrap();
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.exit_code(), 1);
        // original jars untouched on failure
        assert!(tmp.path().join("sodium-0.5.8.jar").exists());
        assert!(tmp.path().join("lithium-0.11.2.jar").exists());
    }

    #[test]
    fn report_summary_lists_updates_and_failures() {
        let report = UpdateReport {
            updated: vec!["sodium-0.5.7.jar -> sodium-0.5.8.jar".to_owned()],
            unchanged: 3,
            failed: vec![("unknownmod.jar".to_owned(), "no compatible version".to_owned())],
        };
        let summary = report.summary();
        assert!(summary.contains("1 updated, 3 current, 1 failed"));
        assert!(summary.contains("⬆️ sodium-0.5.7.jar -> sodium-0.5.8.jar"));
        assert!(summary.contains("❌ unknownmod.jar"));
    }
}
