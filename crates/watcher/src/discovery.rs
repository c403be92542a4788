//! 서버 디스커버리 -- servers_dir 스캔으로 감시 대상 서버 집합을 만듭니다.
//!
//! Crafty 레이아웃을 가정합니다:
//! ```text
//! <servers_dir>/<uuid>/logs/latest.log
//! <servers_dir>/<uuid>/server.properties   (표시 이름, 선택)
//! ```
//!
//! 스캔 한 번은 불변 스냅샷 하나를 만듭니다. 로그 파일이 없는 디렉토리는
//! 아직 기동 전인 서버이므로 에러가 아니라 스킵 대상입니다.

use std::collections::HashMap;
use std::path::Path;

use craftwatch_core::types::ServerInfo;

use crate::error::WatcherError;

/// server.properties에서 표시 이름을 읽는 키
const SERVER_NAME_KEY: &str = "server-name";

/// servers_dir를 스캔하여 감시 가능한 서버 목록을 반환합니다.
///
/// - `logs/latest.log`가 없는 하위 디렉토리는 스킵합니다 (debug 로그).
/// - 표시 이름은 `server.properties`의 `server-name` 값이며,
///   읽기 실패 시 디렉토리명(id)으로 폴백합니다.
/// - `servers_dir` 자체를 열거할 수 없을 때만 에러를 반환합니다.
pub async fn discover(servers_dir: &Path) -> Result<HashMap<String, ServerInfo>, WatcherError> {
    let mut entries =
        tokio::fs::read_dir(servers_dir)
            .await
            .map_err(|e| WatcherError::Discovery {
                path: servers_dir.display().to_string(),
                reason: e.to_string(),
            })?;

    let mut servers = HashMap::new();

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                return Err(WatcherError::Discovery {
                    path: servers_dir.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let Some(id) = entry.file_name().to_str().map(str::to_owned) else {
            tracing::debug!(path = %path.display(), "skipping non-utf8 server directory");
            continue;
        };

        let log_path = path.join("logs").join("latest.log");
        if !tokio::fs::try_exists(&log_path).await.unwrap_or(false) {
            tracing::debug!(server_id = %id, "no latest.log yet, skipping");
            continue;
        }

        let display_name = read_display_name(&path, &id).await;

        servers.insert(
            id.clone(),
            ServerInfo {
                id,
                display_name,
                log_path,
            },
        );
    }

    Ok(servers)
}

/// server.properties에서 표시 이름을 읽습니다. 실패 시 id로 폴백합니다.
async fn read_display_name(server_dir: &Path, id: &str) -> String {
    let properties_path = server_dir.join("server.properties");
    match tokio::fs::read_to_string(&properties_path).await {
        Ok(content) => parse_server_name(&content).unwrap_or_else(|| id.to_owned()),
        Err(_) => id.to_owned(),
    }
}

/// properties 형식 텍스트에서 server-name 값을 찾습니다.
fn parse_server_name(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let line = line.trim();
        if line.starts_with('#') {
            return None;
        }
        let (key, value) = line.split_once('=')?;
        if key.trim() == SERVER_NAME_KEY {
            let value = value.trim();
            if value.is_empty() {
                None
            } else {
                Some(value.to_owned())
            }
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn make_server(base: &Path, id: &str, with_log: bool, properties: Option<&str>) -> PathBuf {
        let dir = base.join(id);
        std::fs::create_dir_all(dir.join("logs")).unwrap();
        if with_log {
            std::fs::write(dir.join("logs").join("latest.log"), "").unwrap();
        }
        if let Some(props) = properties {
            std::fs::write(dir.join("server.properties"), props).unwrap();
        }
        dir
    }

    #[test]
    fn parse_server_name_basic() {
        let content = "gamemode=survival\nserver-name=Skyblock\nmotd=hello";
        assert_eq!(parse_server_name(content), Some("Skyblock".to_owned()));
    }

    #[test]
    fn parse_server_name_ignores_comments() {
        let content = "#server-name=Commented\nserver-name=Real";
        assert_eq!(parse_server_name(content), Some("Real".to_owned()));
    }

    #[test]
    fn parse_server_name_missing_or_empty() {
        assert_eq!(parse_server_name("motd=hello"), None);
        assert_eq!(parse_server_name("server-name="), None);
    }

    #[tokio::test]
    async fn discover_finds_servers_with_logs() {
        let tmp = tempfile::tempdir().unwrap();
        make_server(tmp.path(), "a1b2c3", true, Some("server-name=Skyblock"));
        make_server(tmp.path(), "d4e5f6", true, None);

        let servers = discover(tmp.path()).await.unwrap();
        assert_eq!(servers.len(), 2);
        assert_eq!(servers["a1b2c3"].display_name, "Skyblock");
        // server.properties 없으면 id로 폴백
        assert_eq!(servers["d4e5f6"].display_name, "d4e5f6");
        assert!(servers["a1b2c3"].log_path.ends_with("logs/latest.log"));
    }

    #[tokio::test]
    async fn discover_skips_servers_without_log() {
        let tmp = tempfile::tempdir().unwrap();
        make_server(tmp.path(), "running", true, None);
        make_server(tmp.path(), "not-started", false, None);

        let servers = discover(tmp.path()).await.unwrap();
        assert_eq!(servers.len(), 1);
        assert!(servers.contains_key("running"));
    }

    #[tokio::test]
    async fn discover_skips_plain_files() {
        let tmp = tempfile::tempdir().unwrap();
        make_server(tmp.path(), "real", true, None);
        std::fs::write(tmp.path().join("README.txt"), "not a server").unwrap();

        let servers = discover(tmp.path()).await.unwrap();
        assert_eq!(servers.len(), 1);
    }

    #[tokio::test]
    async fn discover_empty_dir_returns_empty_map() {
        let tmp = tempfile::tempdir().unwrap();
        let servers = discover(tmp.path()).await.unwrap();
        assert!(servers.is_empty());
    }

    #[tokio::test]
    async fn discover_missing_base_dir_is_error() {
        let result = discover(Path::new("/nonexistent/craftwatch/servers")).await;
        assert!(matches!(result, Err(WatcherError::Discovery { .. })));
    }
}
