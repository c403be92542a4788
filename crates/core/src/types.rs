//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// 발견된 Minecraft 서버 정보
///
/// 디스커버리 스캔 한 번으로 생성되는 불변 스냅샷입니다.
/// 서버의 동일성은 `id`(디렉토리명, Crafty UUID)로 판단합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// 서버 식별자 (servers_dir 하위 디렉토리명)
    pub id: String,
    /// 표시 이름 (server.properties의 server-name, 없으면 id)
    pub display_name: String,
    /// latest.log 경로
    pub log_path: PathBuf,
}

impl fmt::Display for ServerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.id)
    }
}

/// 알림 카테고리
///
/// 라우터 핸들러가 매칭한 이벤트의 종류를 나타냅니다.
/// 싱크는 카테고리에 따라 색상/사운드를 결정합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// 플레이어 접속
    PlayerJoined,
    /// 플레이어 접속 종료
    PlayerLeft,
    /// 서버 기동 완료
    ServerReady,
    /// 서버 에러 로그
    ServerError,
    /// 서버 치명적 에러
    ServerFatal,
}

impl EventCategory {
    /// 사람이 읽을 수 있는 짧은 요약 제목을 반환합니다.
    pub fn summary(&self) -> &'static str {
        match self {
            Self::PlayerJoined => "🟢 Player Joined",
            Self::PlayerLeft => "🔴 Player Disconnected",
            Self::ServerReady => "✅ Server Ready",
            Self::ServerError => "❌ Server Error",
            Self::ServerFatal => "💀 Server Fatal",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlayerJoined => write!(f, "player_joined"),
            Self::PlayerLeft => write!(f, "player_left"),
            Self::ServerReady => write!(f, "server_ready"),
            Self::ServerError => write!(f, "server_error"),
            Self::ServerFatal => write!(f, "server_fatal"),
        }
    }
}

/// 전송할 알림 내용
///
/// 라우터가 생성하고 싱크가 소비합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// 알림을 발생시킨 서버의 표시 이름
    pub server_name: String,
    /// 포맷된 메시지 본문 (mrkdwn)
    pub message: String,
    /// 카테고리
    pub category: EventCategory,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.category, self.server_name, self.message,
        )
    }
}
