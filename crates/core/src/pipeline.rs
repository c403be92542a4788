//! 파이프라인 trait — 모듈 생명주기 정의
//!
//! 데몬이 관리하는 모든 모듈은 [`Pipeline`]을 구현하여
//! 동일한 생명주기(start/stop/health_check)로 관리됩니다.
//!
//! # 생명주기
//! ```text
//! Initialized → start() → Running → stop() → Stopped
//! ```

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;

use crate::error::CraftwatchError;

/// Boxed future 타입 별칭
///
/// RPITIT trait을 dyn 호환 컨텍스트에서 다룰 때 사용합니다.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 모듈 건강 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    /// 정상
    Healthy,
    /// 동작 중이나 주의 필요 (사유 포함)
    Degraded(String),
    /// 비정상 (사유 포함)
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태인지 확인합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 비정상 상태인지 확인합니다.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

/// 모듈 생명주기 trait
///
/// # 구현 규약
/// - `start()`는 백그라운드 태스크를 스폰하고 즉시 반환합니다.
///   이미 실행 중이면 에러를 반환합니다.
/// - `stop()`은 모든 태스크에 취소 신호를 보내고, 유한 시간 내에
///   정리가 끝날 때까지 대기합니다. 실행 중이 아니면 에러를 반환합니다.
/// - `health_check()`는 상태를 변경하지 않습니다.
pub trait Pipeline: Send {
    /// 모듈을 시작합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), CraftwatchError>> + Send;

    /// 모듈을 정지합니다 (graceful shutdown).
    fn stop(&mut self) -> impl Future<Output = Result<(), CraftwatchError>> + Send;

    /// 모듈의 건강 상태를 확인합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_status_checks() {
        assert!(HealthStatus::Healthy.is_healthy());
        assert!(!HealthStatus::Healthy.is_unhealthy());
    }

    #[test]
    fn degraded_is_neither_healthy_nor_unhealthy() {
        let status = HealthStatus::Degraded("3 of 4 tasks running".to_owned());
        assert!(!status.is_healthy());
        assert!(!status.is_unhealthy());
    }

    #[test]
    fn unhealthy_status_checks() {
        let status = HealthStatus::Unhealthy("stopped".to_owned());
        assert!(status.is_unhealthy());
    }
}
