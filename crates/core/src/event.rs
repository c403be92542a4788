//! 이벤트 시스템 — 모듈 간 통신의 기본 단위
//!
//! watcher와 notify 사이의 통신은 `tokio::mpsc` 채널을 통한
//! 이벤트 메시지 패싱으로 수행됩니다. [`EventMetadata`]는 모든 이벤트에
//! 공통으로 포함되는 추적 정보입니다.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::types::Notification;

// --- 모듈명 상수 ---

/// 감시 모듈명
pub const MODULE_WATCHER: &str = "watcher";
/// 알림 모듈명
pub const MODULE_NOTIFY: &str = "notify";

// --- 이벤트 타입 상수 ---

/// 로그 라인 이벤트 타입
pub const EVENT_TYPE_LINE: &str = "line";
/// 알림 이벤트 타입
pub const EVENT_TYPE_NOTIFY: &str = "notify";

/// 이벤트 메타데이터 — 발생 시각, 생성 모듈, 추적 ID
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// 이벤트 발생 시각
    pub timestamp: SystemTime,
    /// 이벤트를 생성한 모듈명
    pub source_module: String,
    /// 추적 ID — 같은 흐름의 이벤트를 연결합니다
    pub trace_id: String,
}

impl EventMetadata {
    /// 기존 trace_id를 사용하여 새 메타데이터를 생성합니다.
    pub fn new(source_module: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: trace_id.into(),
        }
    }

    /// 새로운 UUID v4 trace_id를 생성하여 메타데이터를 만듭니다.
    pub fn with_new_trace(source_module: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// 모든 이벤트가 구현해야 하는 기본 trait
///
/// `Send + Sync + 'static` 바운드로 `tokio::mpsc` 채널을 통한
/// 안전한 전송을 보장합니다.
pub trait Event: Send + Sync + 'static {
    /// 이벤트 고유 ID (UUID v4)
    fn event_id(&self) -> &str;

    /// 이벤트 메타데이터
    fn metadata(&self) -> &EventMetadata;

    /// 이벤트 타입명 (로깅에 사용)
    fn event_type(&self) -> &str;
}

/// 테일러가 읽어낸 로그 라인 이벤트
///
/// 중복 제거를 통과한 원시 라인을 담습니다.
#[derive(Debug, Clone)]
pub struct LineEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 라인을 발생시킨 서버 ID
    pub server_id: String,
    /// 서버 표시 이름
    pub server_name: String,
    /// 원시 로그 라인 (개행 제거됨)
    pub line: String,
}

impl LineEvent {
    /// 새로운 trace를 시작하는 라인 이벤트를 생성합니다.
    pub fn new(
        server_id: impl Into<String>,
        server_name: impl Into<String>,
        line: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::with_new_trace(MODULE_WATCHER),
            server_id: server_id.into(),
            server_name: server_name.into(),
            line: line.into(),
        }
    }
}

impl Event for LineEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_LINE
    }
}

impl fmt::Display for LineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LineEvent[{}] server={} line={}",
            &self.id[..8.min(self.id.len())],
            self.server_id,
            self.line,
        )
    }
}

/// 라우터 매칭으로 생성된 알림 이벤트
#[derive(Debug, Clone)]
pub struct NotifyEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 알림 내용
    pub notification: Notification,
}

impl NotifyEvent {
    /// 새로운 trace를 시작하는 알림 이벤트를 생성합니다.
    pub fn new(notification: Notification) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::with_new_trace(MODULE_WATCHER),
            notification,
        }
    }

    /// 기존 trace에 연결된 알림 이벤트를 생성합니다.
    pub fn with_trace(notification: Notification, trace_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::new(MODULE_WATCHER, trace_id),
            notification,
        }
    }
}

impl Event for NotifyEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_NOTIFY
    }
}

impl fmt::Display for NotifyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NotifyEvent[{}] server={} category={}",
            &self.id[..8.min(self.id.len())],
            self.notification.server_name,
            self.notification.category,
        )
    }
}
