//! 알림 싱크 trait
//!
//! 모든 전송 채널(Slack, Pushover)은 [`NotifySink`]를 구현합니다.
//! 디스패처가 `dyn NotifySink`로 다루므로 [`BoxFuture`]를 반환합니다.

use craftwatch_core::error::NotifyError;
use craftwatch_core::event::NotifyEvent;
use craftwatch_core::pipeline::BoxFuture;

/// 알림 전송 채널 추상화
///
/// # 구현 규약
/// - 미설정 싱크(webhook URL, 자격증명 누락)는 생성 단계에서 걸러지며,
///   `send`는 설정된 싱크에서만 호출됩니다.
/// - 전송 실패는 `Err`로 보고하되, 재시도는 하지 않습니다.
///   재전송 정책은 상위(디스패처)의 몫이며, 현재 정책은 "로그만 남김"입니다.
pub trait NotifySink: Send + Sync {
    /// 싱크 이름 (로깅에 사용)
    fn name(&self) -> &'static str;

    /// 알림 이벤트를 전송합니다.
    fn send<'a>(&'a self, event: &'a NotifyEvent) -> BoxFuture<'a, Result<(), NotifyError>>;
}
