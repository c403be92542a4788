//! Craftwatch 알림 크레이트 -- 알림 싱크와 팬아웃 디스패처
//!
//! # 모듈 구성
//!
//! - [`sink`]: 전송 채널 추상화 trait
//! - [`slack`]: Slack Incoming Webhook 싱크 (Block Kit)
//! - [`pushover`]: Pushover messages API 싱크
//! - [`dispatcher`]: 알림 이벤트를 모든 싱크로 팬아웃 (Pipeline 구현)
//!
//! # 아키텍처
//!
//! ```text
//! watcher -> mpsc -> NotifyDispatcher -> Slack / Pushover (동시 전송)
//! ```

pub mod dispatcher;
pub mod pushover;
pub mod sink;
pub mod slack;

// --- 주요 타입 re-export ---

// 디스패처
pub use dispatcher::{NotifyDispatcher, NotifyDispatcherBuilder};

// 싱크
pub use pushover::PushoverSink;
pub use sink::NotifySink;
pub use slack::SlackSink;
