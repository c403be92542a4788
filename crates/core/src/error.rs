//! 에러 타입 — 도메인별 에러 정의

/// Craftwatch 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum CraftwatchError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 감시(watch) 처리 에러
    #[error("watch error: {0}")]
    Watch(#[from] WatchError),

    /// 알림 전송 에러
    #[error("notify error: {0}")]
    Notify(#[from] NotifyError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 감시 처리 에러
///
/// 서버 디스커버리, 테일링, 슈퍼바이저 루프에서 발생합니다.
/// 개별 서버의 일시적 실패는 에러가 아니라 스킵으로 처리되므로,
/// 여기 정의된 에러는 전체 스캔 실패 같은 복구 불가능한 상황만 다룹니다.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// 서버 베이스 디렉토리 열거 실패
    #[error("failed to enumerate servers dir {path}: {reason}")]
    DiscoveryFailed { path: String, reason: String },

    /// 이미 실행 중인 모듈을 다시 시작함
    #[error("watcher already running")]
    AlreadyRunning,

    /// 실행 중이 아닌 모듈을 정지함
    #[error("watcher not running")]
    NotRunning,

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),
}

/// 알림 전송 에러
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// 싱크 미설정 (webhook URL, 자격증명 누락)
    #[error("sink '{sink}' not configured")]
    NotConfigured { sink: String },

    /// HTTP 요청 실패
    #[error("sink '{sink}' request failed: {reason}")]
    RequestFailed { sink: String, reason: String },

    /// 2xx 이외의 응답
    #[error("sink '{sink}' rejected payload: status {status}: {body}")]
    Rejected {
        sink: String,
        status: u16,
        body: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidValue {
            field: "watcher.dedup_window_secs".to_owned(),
            reason: "must be a number".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("dedup_window_secs"));
        assert!(msg.contains("must be a number"));
    }

    #[test]
    fn watch_error_converts_to_craftwatch_error() {
        let err: CraftwatchError = WatchError::AlreadyRunning.into();
        assert!(matches!(err, CraftwatchError::Watch(_)));
    }

    #[test]
    fn notify_error_rejected_display() {
        let err = NotifyError::Rejected {
            sink: "slack".to_owned(),
            status: 404,
            body: "no_service".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("slack"));
        assert!(msg.contains("404"));
    }
}
