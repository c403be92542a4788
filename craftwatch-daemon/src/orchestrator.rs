//! Module orchestration -- assembly, channel wiring, and lifecycle management.
//!
//! The [`Orchestrator`] is the central coordinator of `craftwatch-daemon`.
//! It loads configuration, wires the watcher to the notify dispatcher
//! through an mpsc channel, manages startup/shutdown ordering, and waits
//! for termination signals.
//!
//! # Startup Order (producers before consumers)
//!
//! 1. Watch supervisor (produces NotifyEvents)
//! 2. Notify dispatcher (consumes NotifyEvents)
//!
//! # Shutdown Order (same as startup)
//!
//! 1. Watch supervisor (stop producing)
//! 2. Notify dispatcher (drain remaining events)

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::mpsc;

use craftwatch_core::config::CraftwatchConfig;
use craftwatch_core::pipeline::Pipeline;
use craftwatch_notify::NotifyDispatcherBuilder;
use craftwatch_watcher::{WatchConfig, WatchSupervisorBuilder};

use crate::health::{DaemonHealth, ModuleHealth, aggregate_status};

/// Capacity of the watcher -> notify channel.
const NOTIFY_CHANNEL_CAPACITY: usize = 256;

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: CraftwatchConfig,
    /// Watch supervisor module.
    supervisor: craftwatch_watcher::WatchSupervisor,
    /// Notify dispatcher module.
    dispatcher: craftwatch_notify::NotifyDispatcher,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
}

impl Orchestrator {
    /// Load configuration from a file and build the orchestrator.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = CraftwatchConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config)
    }

    /// Build from an already-loaded configuration.
    ///
    /// Useful for testing or when config has already been loaded.
    pub fn build_from_config(config: CraftwatchConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        tracing::debug!("creating watcher -> notify channel");
        let (notify_tx, notify_rx) = mpsc::channel(NOTIFY_CHANNEL_CAPACITY);

        let watch_config = WatchConfig::from_core(&config);
        let (supervisor, _) = WatchSupervisorBuilder::new()
            .config(watch_config)
            .notify_sender(notify_tx)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build watch supervisor: {}", e))?;

        let dispatcher = NotifyDispatcherBuilder::new()
            .config(config.notify.clone())
            .receiver(notify_rx)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build notify dispatcher: {}", e))?;

        tracing::info!(
            sinks = dispatcher.sink_count(),
            servers_dir = %config.discovery.servers_dir,
            "orchestrator initialized"
        );

        Ok(Self {
            config,
            supervisor,
            dispatcher,
            start_time: Instant::now(),
        })
    }

    /// Start all modules and block until a shutdown signal arrives.
    ///
    /// # Shutdown Triggers
    ///
    /// - `SIGTERM` (from systemd, Docker, or `kill`)
    /// - `SIGINT` (Ctrl+C)
    pub async fn run(&mut self) -> Result<()> {
        if !self.config.general.pid_file.is_empty() {
            write_pid_file(Path::new(&self.config.general.pid_file))?;
        }

        tracing::info!("starting modules");
        if let Err(e) = self.supervisor.start().await {
            self.cleanup_pid_file();
            return Err(anyhow::anyhow!("failed to start watch supervisor: {}", e));
        }
        if let Err(e) = self.dispatcher.start().await {
            // Rollback the already-started supervisor
            tracing::warn!("dispatcher startup failed, stopping supervisor");
            if let Err(stop_err) = self.supervisor.stop().await {
                tracing::error!(error = %stop_err, "supervisor rollback failed");
            }
            self.cleanup_pid_file();
            return Err(anyhow::anyhow!("failed to start notify dispatcher: {}", e));
        }

        tracing::info!("craftwatch-daemon running -- modules active");
        let signal = wait_for_shutdown_signal().await?;
        tracing::info!(signal = signal, "shutdown signal received");

        self.shutdown().await;
        self.cleanup_pid_file();
        Ok(())
    }

    /// Perform graceful shutdown: producer first, then consumer drains.
    async fn shutdown(&mut self) {
        tracing::info!("stopping modules");
        if let Err(e) = self.supervisor.stop().await {
            tracing::error!(error = %e, "failed to stop watch supervisor");
        }
        if let Err(e) = self.dispatcher.stop().await {
            tracing::error!(error = %e, "failed to stop notify dispatcher");
        }
    }

    /// Get the current aggregated health status.
    pub async fn health(&self) -> DaemonHealth {
        let modules = vec![
            ModuleHealth {
                name: "watcher".to_owned(),
                status: self.supervisor.health_check().await,
            },
            ModuleHealth {
                name: "notify".to_owned(),
                status: self.dispatcher.health_check().await,
            },
        ];

        DaemonHealth {
            status: aggregate_status(&modules),
            uptime_secs: self.start_time.elapsed().as_secs(),
            modules,
        }
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &CraftwatchConfig {
        &self.config
    }

    fn cleanup_pid_file(&self) {
        if !self.config.general.pid_file.is_empty() {
            remove_pid_file(Path::new(&self.config.general.pid_file));
        }
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Write the current process PID to a file.
///
/// Used to prevent duplicate daemon instances. The file is created with
/// `create_new(true)` so an existing file fails fast, and the result is
/// verified to be a regular file.
fn write_pid_file(path: &Path) -> Result<()> {
    use std::fs::{self, OpenOptions};
    use std::io::{ErrorKind, Write};

    if let Some(parent) = path.parent() {
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            let mut builder = fs::DirBuilder::new();
            builder.mode(0o700).recursive(true);
            builder.create(parent)?;
        }
        #[cfg(not(unix))]
        {
            fs::create_dir_all(parent)?;
        }
    }

    let pid = std::process::id();

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            let existing_pid = fs::read_to_string(path).unwrap_or_else(|_| "unknown".to_owned());
            return Err(anyhow::anyhow!(
                "PID file {} already exists with PID: {}. Is another instance running?",
                path.display(),
                existing_pid.trim()
            ));
        }
        Err(e) => return Err(e.into()),
    };

    let metadata = file.metadata()?;
    if !metadata.is_file() {
        let _ = fs::remove_file(path);
        return Err(anyhow::anyhow!(
            "PID file {} is not a regular file",
            path.display()
        ));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }

    writeln!(file, "{}", pid)?;

    tracing::info!(pid = pid, path = %path.display(), "PID file written");
    Ok(())
}

/// Remove the PID file on daemon shutdown.
///
/// Logs a warning but does not fail if the file cannot be removed.
fn remove_pid_file(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "failed to remove PID file"
        );
    } else {
        tracing::info!(path = %path.display(), "PID file removed");
    }
}
