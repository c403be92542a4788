//! Watcher integration tests: rotation ordering and supervisor reconciliation
//! against a real temp directory tree.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use craftwatch_core::event::NotifyEvent;
use craftwatch_core::pipeline::Pipeline;
use craftwatch_core::types::ServerInfo;
use craftwatch_watcher::tailer::LogTailer;
use craftwatch_watcher::{WatchConfig, WatchSupervisorBuilder};

fn make_server(base: &Path, id: &str, name: &str) -> PathBuf {
    let dir = base.join(id);
    std::fs::create_dir_all(dir.join("logs")).unwrap();
    std::fs::write(dir.join("logs").join("latest.log"), "").unwrap();
    std::fs::write(dir.join("server.properties"), format!("server-name={name}")).unwrap();
    dir
}

fn append_line(dir: &Path, line: &str) {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(dir.join("logs").join("latest.log"))
        .unwrap();
    writeln!(file, "{line}").unwrap();
}

fn error_line(content: &str) -> String {
    format!("[10:00:00] [Server thread/ERROR]: {content}")
}

/// Collect notify events until the channel stays quiet for `quiet`.
async fn drain_events(rx: &mut mpsc::Receiver<NotifyEvent>, quiet: Duration) -> Vec<NotifyEvent> {
    let mut events = Vec::new();
    while let Ok(Some(event)) = tokio::time::timeout(quiet, rx.recv()).await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn tailer_preserves_order_across_rename_rotation() {
    let tmp = tempfile::tempdir().unwrap();
    let log_path = tmp.path().join("latest.log");
    std::fs::write(&log_path, "").unwrap();

    let config = WatchConfig {
        poll_interval_ms: 25,
        ..WatchConfig::default()
    };
    let server = ServerInfo {
        id: "rotating".to_owned(),
        display_name: "Rotating".to_owned(),
        log_path: log_path.clone(),
    };

    let (tx, mut rx) = mpsc::channel(64);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(LogTailer::new(server, &config, tx).run(cancel.clone()));

    tokio::time::sleep(Duration::from_millis(80)).await;

    // Lines in the old file before rotation
    {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&log_path)
            .unwrap();
        writeln!(file, "old-1").unwrap();
        writeln!(file, "old-2").unwrap();
    }
    tokio::time::sleep(Duration::from_millis(80)).await;

    // Crafty-style rotation: rename then create a fresh latest.log
    std::fs::rename(&log_path, tmp.path().join("latest.log.1")).unwrap();
    std::fs::write(&log_path, "new-1\nnew-2\n").unwrap();

    let mut lines = Vec::new();
    while lines.len() < 4 {
        let event = tokio::time::timeout(Duration::from_secs(3), rx.recv())
            .await
            .expect("timed out waiting for rotation lines")
            .expect("channel closed");
        lines.push(event.line);
    }

    // Old tail first, then the new file, nothing lost or duplicated
    assert_eq!(lines, vec!["old-1", "old-2", "new-1", "new-2"]);

    cancel.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn reconciliation_stops_removed_and_starts_new_without_touching_survivors() {
    let tmp = tempfile::tempdir().unwrap();
    let dir_a = make_server(tmp.path(), "server-a", "Alpha");
    let dir_b = make_server(tmp.path(), "server-b", "Beta");

    let config = WatchConfig {
        servers_dir: tmp.path().to_path_buf(),
        scan_interval_secs: 1,
        poll_interval_ms: 25,
        dedup_window_secs: 300,
        ..WatchConfig::default()
    };
    let (mut supervisor, notify_rx) = WatchSupervisorBuilder::new().config(config).build().unwrap();
    let mut notify_rx = notify_rx.unwrap();

    supervisor.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(supervisor.watched_count(), 2);

    // Both initial servers deliver
    append_line(&dir_a, &error_line("alpha broke"));
    append_line(&dir_b, &error_line("beta broke"));
    let events = drain_events(&mut notify_rx, Duration::from_millis(600)).await;
    let mut names: Vec<String> = events
        .iter()
        .map(|e| e.notification.server_name.clone())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Alpha", "Beta"]);

    // {A, B} -> {B, C}
    std::fs::remove_dir_all(&dir_a).unwrap();
    let dir_c = make_server(tmp.path(), "server-c", "Gamma");
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(supervisor.watched_count(), 2);

    // B keeps its dedup state across the reconcile: a repeat of the earlier
    // line must be suppressed, which proves the task was never restarted.
    append_line(&dir_b, &error_line("beta broke"));
    append_line(&dir_b, &error_line("beta broke again"));
    append_line(&dir_c, &error_line("gamma broke"));

    let events = drain_events(&mut notify_rx, Duration::from_millis(600)).await;
    let mut summary: Vec<(String, bool)> = events
        .iter()
        .map(|e| {
            (
                e.notification.server_name.clone(),
                e.notification.message.contains("beta broke again"),
            )
        })
        .collect();
    summary.sort();
    assert_eq!(events.len(), 2, "expected exactly B-new and C events");
    assert!(summary.iter().any(|(name, again)| name == "Beta" && *again));
    assert!(summary.iter().any(|(name, _)| name == "Gamma"));

    supervisor.stop().await.unwrap();
}

#[tokio::test]
async fn failing_watch_task_does_not_affect_siblings() {
    let tmp = tempfile::tempdir().unwrap();
    let dir_ok = make_server(tmp.path(), "healthy", "Healthy");

    // latest.log as a directory: discovery sees it, the tailer cannot open it
    let broken = tmp.path().join("broken");
    std::fs::create_dir_all(broken.join("logs").join("latest.log")).unwrap();

    let config = WatchConfig {
        servers_dir: tmp.path().to_path_buf(),
        scan_interval_secs: 1,
        poll_interval_ms: 25,
        ..WatchConfig::default()
    };
    let (mut supervisor, notify_rx) = WatchSupervisorBuilder::new().config(config).build().unwrap();
    let mut notify_rx = notify_rx.unwrap();

    supervisor.start().await.unwrap();
    // Let a few reconcile ticks pass so the broken task fails and restarts
    tokio::time::sleep(Duration::from_millis(2500)).await;

    append_line(&dir_ok, &error_line("still delivering"));
    let events = drain_events(&mut notify_rx, Duration::from_millis(600)).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].notification.server_name, "Healthy");

    supervisor.stop().await.unwrap();
}
