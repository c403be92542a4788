//! 감시 모듈 설정 (core 설정 확장)

use std::path::PathBuf;

use craftwatch_core::config::CraftwatchConfig;

use crate::error::WatcherError;

/// 감시 모듈 설정
///
/// core의 `[discovery]`, `[watcher]` 섹션에서 파생됩니다.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// 서버 베이스 디렉토리
    pub servers_dir: PathBuf,
    /// 디스커버리 스캔 및 reconcile 주기 (초)
    pub scan_interval_secs: u64,
    /// 파일 상태 체크 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// 중복 제거 윈도우 (초, 0이면 비활성화)
    pub dedup_window_secs: u64,
    /// 최대 라인 길이 (바이트, 초과분은 잘라냄)
    pub max_line_length: usize,
    /// 라인 채널 용량 (테일러 -> 라우터)
    pub line_channel_capacity: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            servers_dir: PathBuf::from("/servers"),
            scan_interval_secs: 5,
            poll_interval_ms: 500,
            dedup_window_secs: 30,
            max_line_length: 16 * 1024,
            line_channel_capacity: 1024,
        }
    }
}

impl WatchConfig {
    /// 통합 설정에서 감시 설정을 추출합니다.
    pub fn from_core(config: &CraftwatchConfig) -> Self {
        Self {
            servers_dir: PathBuf::from(&config.discovery.servers_dir),
            scan_interval_secs: config.discovery.scan_interval_secs,
            poll_interval_ms: config.watcher.poll_interval_ms,
            dedup_window_secs: config.watcher.dedup_window_secs,
            max_line_length: config.watcher.max_line_length,
            ..Self::default()
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), WatcherError> {
        if self.servers_dir.as_os_str().is_empty() {
            return Err(WatcherError::Discovery {
                path: String::new(),
                reason: "servers_dir must not be empty".to_owned(),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(WatcherError::Tail {
                server_id: "*".to_owned(),
                reason: "poll_interval_ms must be at least 1".to_owned(),
            });
        }
        if self.scan_interval_secs == 0 {
            return Err(WatcherError::Discovery {
                path: self.servers_dir.display().to_string(),
                reason: "scan_interval_secs must be at least 1".to_owned(),
            });
        }
        if self.max_line_length == 0 {
            return Err(WatcherError::Tail {
                server_id: "*".to_owned(),
                reason: "max_line_length must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}
