//! 감시 모듈 에러 타입
//!
//! [`WatcherError`]는 디스커버리, 테일링, 슈퍼바이저 내부에서 발생하는
//! 모든 에러를 표현합니다. `From<WatcherError> for CraftwatchError` 변환이
//! 구현되어 있어 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use craftwatch_core::error::{CraftwatchError, WatchError};

/// 감시 모듈 도메인 에러
///
/// 개별 서버의 일시적 실패(로그 파일 잠시 없음 등)는 에러가 아니라
/// 스킵으로 처리됩니다. 여기 정의된 에러는 전체 스캔 실패나
/// 생명주기 위반 같은 상황만 다룹니다.
#[derive(Debug, thiserror::Error)]
pub enum WatcherError {
    /// 서버 베이스 디렉토리 열거 실패
    #[error("discovery error: {path}: {reason}")]
    Discovery {
        /// 스캔 대상 디렉토리
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 테일링 중 파일 에러
    #[error("tail error: {server_id}: {reason}")]
    Tail {
        /// 대상 서버 ID
        server_id: String,
        /// 실패 사유
        reason: String,
    },

    /// 이미 실행 중인 슈퍼바이저를 다시 시작함
    #[error("supervisor already running")]
    AlreadyRunning,

    /// 실행 중이 아닌 슈퍼바이저를 정지함
    #[error("supervisor not running")]
    NotRunning,

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<WatcherError> for CraftwatchError {
    fn from(err: WatcherError) -> Self {
        match err {
            WatcherError::Discovery { path, reason } => {
                CraftwatchError::Watch(WatchError::DiscoveryFailed { path, reason })
            }
            WatcherError::AlreadyRunning => CraftwatchError::Watch(WatchError::AlreadyRunning),
            WatcherError::NotRunning => CraftwatchError::Watch(WatchError::NotRunning),
            WatcherError::Channel(msg) => CraftwatchError::Watch(WatchError::Channel(msg)),
            WatcherError::Io(e) => CraftwatchError::Io(e),
            other => CraftwatchError::Watch(WatchError::Channel(other.to_string())),
        }
    }
}
