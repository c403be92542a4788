//! 설정 관리 — craftwatch.toml 파싱 및 런타임 설정
//!
//! [`CraftwatchConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`CRAFTWATCH_NOTIFY_SLACK_WEBHOOK_URL=...` 형식)
//! 3. 설정 파일 (`craftwatch.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), craftwatch_core::error::CraftwatchError> {
//! use craftwatch_core::config::CraftwatchConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = CraftwatchConfig::load("craftwatch.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = CraftwatchConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, CraftwatchError};

/// Craftwatch 통합 설정
///
/// `craftwatch.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CraftwatchConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 서버 디스커버리 설정
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// 감시(테일링/중복제거) 설정
    #[serde(default)]
    pub watcher: WatcherConfig,
    /// 알림 싱크 설정
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl CraftwatchConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CraftwatchError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, CraftwatchError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CraftwatchError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                CraftwatchError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, CraftwatchError> {
        toml::from_str(toml_str).map_err(|e| {
            CraftwatchError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `CRAFTWATCH_{SECTION}_{FIELD}`
    /// 예: `CRAFTWATCH_DISCOVERY_SERVERS_DIR=/srv/minecraft`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "CRAFTWATCH_GENERAL_LOG_LEVEL");
        override_string(
            &mut self.general.log_format,
            "CRAFTWATCH_GENERAL_LOG_FORMAT",
        );
        override_string(&mut self.general.pid_file, "CRAFTWATCH_GENERAL_PID_FILE");

        // Discovery
        override_string(
            &mut self.discovery.servers_dir,
            "CRAFTWATCH_DISCOVERY_SERVERS_DIR",
        );
        override_u64(
            &mut self.discovery.scan_interval_secs,
            "CRAFTWATCH_DISCOVERY_SCAN_INTERVAL_SECS",
        );

        // Watcher
        override_u64(
            &mut self.watcher.poll_interval_ms,
            "CRAFTWATCH_WATCHER_POLL_INTERVAL_MS",
        );
        override_u64(
            &mut self.watcher.dedup_window_secs,
            "CRAFTWATCH_WATCHER_DEDUP_WINDOW_SECS",
        );
        override_usize(
            &mut self.watcher.max_line_length,
            "CRAFTWATCH_WATCHER_MAX_LINE_LENGTH",
        );

        // Notify
        override_string(
            &mut self.notify.slack_webhook_url,
            "CRAFTWATCH_NOTIFY_SLACK_WEBHOOK_URL",
        );
        override_string(
            &mut self.notify.pushover_token,
            "CRAFTWATCH_NOTIFY_PUSHOVER_TOKEN",
        );
        override_string(
            &mut self.notify.pushover_user,
            "CRAFTWATCH_NOTIFY_PUSHOVER_USER",
        );
        override_u64(
            &mut self.notify.timeout_secs,
            "CRAFTWATCH_NOTIFY_TIMEOUT_SECS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 검증 실패는 기동 시점의 치명적 에러입니다. 반쯤 설정된 상태로
    /// 실행을 계속하지 않습니다.
    pub fn validate(&self) -> Result<(), CraftwatchError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.discovery.servers_dir.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "discovery.servers_dir".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.discovery.scan_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "discovery.scan_interval_secs".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }

        if self.watcher.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "watcher.poll_interval_ms".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }

        if self.watcher.max_line_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "watcher.max_line_length".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// PID 파일 경로 (빈 문자열이면 기록하지 않음)
    pub pid_file: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            pid_file: String::new(),
        }
    }
}

/// 서버 디스커버리 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// 서버 베이스 디렉토리 (하위에 uuid 디렉토리)
    pub servers_dir: String,
    /// 디스커버리 스캔 및 reconcile 주기 (초)
    pub scan_interval_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            servers_dir: "/servers".to_owned(),
            scan_interval_secs: 5,
        }
    }
}

/// 감시 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// 파일 상태 체크 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// 중복 제거 윈도우 (초, 0이면 비활성화)
    pub dedup_window_secs: u64,
    /// 최대 라인 길이 (바이트, 초과분은 잘라냄)
    pub max_line_length: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            dedup_window_secs: 30,
            max_line_length: 16 * 1024, // 16KB
        }
    }
}

/// 알림 싱크 설정
///
/// URL/자격증명이 비어 있는 싱크는 비활성화로 간주하며,
/// 알림은 로그 출력으로 대체됩니다 (에러 아님).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Slack Incoming Webhook URL
    pub slack_webhook_url: String,
    /// Pushover 애플리케이션 토큰
    pub pushover_token: String,
    /// Pushover 사용자 키
    pub pushover_user: String,
    /// HTTP 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            slack_webhook_url: String::new(),
            pushover_token: String::new(),
            pushover_user: String::new(),
            timeout_secs: 15,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
