//! 이벤트 라우터 -- 로그 라인을 트리거 패턴으로 분류하여 알림을 만듭니다.
//!
//! [`LineRouter`]는 `(트리거 부분 문자열, 핸들러)` 목록을 명시적 순서로
//! 보관합니다. 라인에 처음 포함된 트리거가 승리하며, 핸들러는
//! [`Outcome`]으로 알림 생성 또는 억제를 결정합니다. 전역 등록이나
//! 예외 기반 제어 흐름은 없습니다.

use std::sync::LazyLock;

use craftwatch_core::types::{EventCategory, Notification};
use regex::Regex;

/// 알림 생성을 억제할 ERROR 패턴 (알려진 무해한 모드 에러)
const SKIP_ERRORS: &[&str] = &["dev.kpherox.vihp.client.jade.VillagerInventoryPlugin"];

static LOGIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r".+\]: (.+)\[/([^\]]+)\] logged in with entity id \d+ at \(([^)]+)\)").unwrap()
});

static LOST_CONNECTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\[Server thread/INFO\]: (.*) lost connection: (.+)").unwrap()
});

/// 핸들러 처리 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 알림 생성
    Notify {
        /// 포맷된 메시지 본문 (mrkdwn)
        message: String,
        /// 알림 카테고리
        category: EventCategory,
    },
    /// 트리거는 일치했으나 알림 억제 (skip 목록 등)
    Suppress,
}

/// 트리거 핸들러 함수 시그니처
type HandlerFn = fn(&str) -> Outcome;

/// 라인 라우터
///
/// 목록 순서가 우선순위입니다. 한 라인은 최대 하나의 핸들러만 거칩니다.
pub struct LineRouter {
    handlers: Vec<(&'static str, HandlerFn)>,
}

impl LineRouter {
    /// 기본 핸들러 세트로 라우터를 만듭니다.
    pub fn with_defaults() -> Self {
        Self {
            handlers: vec![
                ("logged in with entity id", handle_login as HandlerFn),
                ("lost connection", handle_lost_connection),
                ("geyser help for help", handle_server_ready),
                ("ERROR", handle_error),
                ("FATAL", handle_fatal),
            ],
        }
    }

    /// 라인을 분류하여 알림을 생성합니다.
    ///
    /// 트리거 불일치 또는 핸들러 억제 시 `None`을 반환합니다.
    pub fn route(&self, server_name: &str, line: &str) -> Option<Notification> {
        for (trigger, handler) in &self.handlers {
            if !line.contains(trigger) {
                continue;
            }

            return match handler(line) {
                Outcome::Notify { message, category } => Some(Notification {
                    server_name: server_name.to_owned(),
                    message,
                    category,
                }),
                Outcome::Suppress => {
                    tracing::debug!(trigger, line, "notification suppressed");
                    None
                }
            };
        }
        None
    }

    /// 등록된 핸들러 수를 반환합니다.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl Default for LineRouter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn handle_login(line: &str) -> Outcome {
    let Some(caps) = LOGIN_PATTERN.captures(line) else {
        return Outcome::Notify {
            message: "👋 Unknown user logged in".to_owned(),
            category: EventCategory::PlayerJoined,
        };
    };

    let username = caps[1].trim();
    let ip_port = caps[2].trim();
    let location = caps[3].trim();
    // Geyser를 거친 Bedrock 플레이어는 이름이 '.'으로 시작
    let player_type = if username.starts_with('.') {
        "Bedrock"
    } else {
        "Java"
    };

    Outcome::Notify {
        message: format!(
            "✅ _{player_type}_ player *{username}* joined at `{location}` from *{ip_port}*."
        ),
        category: EventCategory::PlayerJoined,
    }
}

fn handle_lost_connection(line: &str) -> Outcome {
    let Some(caps) = LOST_CONNECTION_PATTERN.captures(line) else {
        return Outcome::Notify {
            message: "🚪 Unknown user lost connection".to_owned(),
            category: EventCategory::PlayerLeft,
        };
    };

    let username = caps[1].trim();
    let reason = caps[2].trim();

    Outcome::Notify {
        message: format!("🏃‍♀️{username} left: {reason}"),
        category: EventCategory::PlayerLeft,
    }
}

fn handle_server_ready(line: &str) -> Outcome {
    Outcome::Notify {
        message: format!("🟢 Server ready. {line}"),
        category: EventCategory::ServerReady,
    }
}

fn handle_error(line: &str) -> Outcome {
    for skip in SKIP_ERRORS {
        if line.contains(skip) {
            return Outcome::Suppress;
        }
    }
    Outcome::Notify {
        message: format!("⚠️ {line}"),
        category: EventCategory::ServerError,
    }
}

fn handle_fatal(line: &str) -> Outcome {
    Outcome::Notify {
        message: format!("🛑 {line}"),
        category: EventCategory::ServerFatal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_LINE: &str = "[10:08:36] [Server thread/INFO]: steve[/192.168.1.5:51234] \
                              logged in with entity id 163 at (7.5, 64.0, -12.5)";

    #[test]
    fn routes_java_login() {
        let router = LineRouter::with_defaults();
        let notification = router.route("Skyblock", LOGIN_LINE).unwrap();
        assert_eq!(notification.category, EventCategory::PlayerJoined);
        assert_eq!(notification.server_name, "Skyblock");
        assert!(notification.message.contains("_Java_"));
        assert!(notification.message.contains("*steve*"));
        assert!(notification.message.contains("192.168.1.5:51234"));
    }

    #[test]
    fn routes_bedrock_login() {
        let line = "[10:08:36] [Server thread/INFO]: .alex[/10.0.0.2:19132] \
                    logged in with entity id 99 at (0.5, 70.0, 0.5)";
        let router = LineRouter::with_defaults();
        let notification = router.route("Skyblock", line).unwrap();
        assert!(notification.message.contains("_Bedrock_"));
        assert!(notification.message.contains("*.alex*"));
    }

    #[test]
    fn malformed_login_still_notifies() {
        let line = "weird prefix logged in with entity id";
        let router = LineRouter::with_defaults();
        let notification = router.route("Skyblock", line).unwrap();
        assert!(notification.message.contains("Unknown user"));
        assert_eq!(notification.category, EventCategory::PlayerJoined);
    }

    #[test]
    fn routes_lost_connection() {
        let line = "[10:20:01] [Server thread/INFO]: steve lost connection: Disconnected";
        let router = LineRouter::with_defaults();
        let notification = router.route("Skyblock", line).unwrap();
        assert_eq!(notification.category, EventCategory::PlayerLeft);
        assert!(notification.message.contains("steve left: Disconnected"));
    }

    #[test]
    fn routes_server_ready() {
        let line = "[10:00:30] [Server thread/INFO]: Done (12.345s)! \
                    Run /geyser help for help!";
        let router = LineRouter::with_defaults();
        let notification = router.route("Skyblock", line).unwrap();
        assert_eq!(notification.category, EventCategory::ServerReady);
        assert!(notification.message.starts_with("🟢 Server ready."));
    }

    #[test]
    fn routes_error_line() {
        let line = "[10:30:00] [Server thread/ERROR]: Chunk save failed";
        let router = LineRouter::with_defaults();
        let notification = router.route("Skyblock", line).unwrap();
        assert_eq!(notification.category, EventCategory::ServerError);
        assert!(notification.message.starts_with("⚠️"));
    }

    #[test]
    fn suppresses_known_noisy_error() {
        let line = "[10:30:00] [Render thread/ERROR]: \
                    dev.kpherox.vihp.client.jade.VillagerInventoryPlugin failed";
        let router = LineRouter::with_defaults();
        assert!(router.route("Skyblock", line).is_none());
    }

    #[test]
    fn routes_fatal_line() {
        let line = "[10:31:00] [Server thread/FATAL]: Out of memory";
        let router = LineRouter::with_defaults();
        let notification = router.route("Skyblock", line).unwrap();
        assert_eq!(notification.category, EventCategory::ServerFatal);
        assert!(notification.message.starts_with("🛑"));
    }

    #[test]
    fn unmatched_line_returns_none() {
        let router = LineRouter::with_defaults();
        let line = "[10:05:00] [Server thread/INFO]: Saving chunks";
        assert!(router.route("Skyblock", line).is_none());
    }

    #[test]
    fn first_trigger_wins() {
        // 접속 트리거가 ERROR보다 먼저 등록되어 있음
        let line = "[10:08:36] [Server thread/INFO]: ERRORPRONE[/1.2.3.4:1] \
                    logged in with entity id 1 at (0, 0, 0)";
        let router = LineRouter::with_defaults();
        let notification = router.route("Skyblock", line).unwrap();
        assert_eq!(notification.category, EventCategory::PlayerJoined);
    }

    #[test]
    fn default_router_has_five_handlers() {
        assert_eq!(LineRouter::with_defaults().handler_count(), 5);
    }
}
