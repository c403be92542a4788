//! Craftwatch 공통 크레이트 — 전 모듈이 공유하는 타입, trait, 에러, 설정
//!
//! # 모듈 구성
//!
//! - [`types`]: 서버 정보, 알림 카테고리 등 도메인 타입
//! - [`event`]: 모듈 간 채널로 전달되는 이벤트 타입
//! - [`config`]: craftwatch.toml 파싱 및 환경변수 오버라이드
//! - [`error`]: 도메인별 에러 타입
//! - [`pipeline`]: 모듈 생명주기 trait (start/stop/health_check)
//!
//! # 아키텍처
//!
//! ```text
//! watcher (discovery -> tailer -> dedup -> router) -> mpsc -> notify (slack/pushover)
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod pipeline;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, CraftwatchError, NotifyError, WatchError};

// 설정
pub use config::CraftwatchConfig;

// 이벤트
pub use event::{Event, EventMetadata, LineEvent, NotifyEvent};

// 파이프라인 trait
pub use pipeline::{HealthStatus, Pipeline};

// 도메인 타입
pub use types::{EventCategory, Notification, ServerInfo};
