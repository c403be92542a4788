//! Slack 싱크 -- Incoming Webhook으로 Block Kit 메시지를 전송합니다.
//!
//! 페이로드 구조 (원래 알림 형식 유지):
//! - header 블록: `Minecraft {서버 이름}`
//! - divider 블록
//! - section 블록: mrkdwn 본문
//! - `text` 필드: 알림 미리보기용 폴백 문자열

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use craftwatch_core::error::NotifyError;
use craftwatch_core::event::NotifyEvent;
use craftwatch_core::pipeline::BoxFuture;

use crate::sink::NotifySink;

/// Slack 메시지 페이로드
#[derive(Debug, Serialize)]
pub struct SlackPayload {
    /// Block Kit 블록 목록
    pub blocks: Vec<SlackBlock>,
    /// 폴백 텍스트 (알림 배너에 표시)
    pub text: String,
}

/// Block Kit 블록
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SlackBlock {
    /// 헤더 블록 (plain_text)
    Header {
        /// 헤더 텍스트
        text: SlackText,
    },
    /// 구분선
    Divider,
    /// 본문 섹션 (mrkdwn)
    Section {
        /// 본문 텍스트
        text: SlackText,
    },
}

/// 블록 내부 텍스트 오브젝트
#[derive(Debug, Serialize)]
pub struct SlackText {
    /// 텍스트 형식 (plain_text | mrkdwn)
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// 내용
    pub text: String,
}

/// Slack Incoming Webhook 싱크
pub struct SlackSink {
    webhook_url: String,
    client: Client,
}

impl SlackSink {
    /// 새 Slack 싱크를 생성합니다.
    pub fn new(webhook_url: impl Into<String>, timeout_secs: u64) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| NotifyError::RequestFailed {
                sink: "slack".to_owned(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            webhook_url: webhook_url.into(),
            client,
        })
    }

    /// 알림 이벤트에서 페이로드를 만듭니다.
    fn build_payload(event: &NotifyEvent) -> SlackPayload {
        let notification = &event.notification;
        SlackPayload {
            blocks: vec![
                SlackBlock::Header {
                    text: SlackText {
                        kind: "plain_text",
                        text: format!("Minecraft {}", notification.server_name),
                    },
                },
                SlackBlock::Divider,
                SlackBlock::Section {
                    text: SlackText {
                        kind: "mrkdwn",
                        text: notification.message.clone(),
                    },
                },
            ],
            text: format!(
                "Minecraft {} Alert: {}",
                notification.server_name,
                notification.category.summary()
            ),
        }
    }
}

impl NotifySink for SlackSink {
    fn name(&self) -> &'static str {
        "slack"
    }

    fn send<'a>(&'a self, event: &'a NotifyEvent) -> BoxFuture<'a, Result<(), NotifyError>> {
        Box::pin(async move {
            let payload = Self::build_payload(event);

            let response = self
                .client
                .post(&self.webhook_url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| NotifyError::RequestFailed {
                    sink: "slack".to_owned(),
                    reason: e.to_string(),
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(NotifyError::Rejected {
                    sink: "slack".to_owned(),
                    status: status.as_u16(),
                    body,
                });
            }

            tracing::debug!(event_id = %event.id, "slack notification sent");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use craftwatch_core::types::{EventCategory, Notification};

    fn sample_event() -> NotifyEvent {
        NotifyEvent::new(Notification {
            server_name: "Skyblock".to_owned(),
            message: "✅ _Java_ player *steve* joined".to_owned(),
            category: EventCategory::PlayerJoined,
        })
    }

    #[test]
    fn payload_has_header_divider_section() {
        let payload = SlackSink::build_payload(&sample_event());
        let json = serde_json::to_value(&payload).unwrap();

        let blocks = json["blocks"].as_array().unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0]["type"], "header");
        assert_eq!(blocks[0]["text"]["type"], "plain_text");
        assert_eq!(blocks[0]["text"]["text"], "Minecraft Skyblock");
        assert_eq!(blocks[1]["type"], "divider");
        assert_eq!(blocks[2]["type"], "section");
        assert_eq!(blocks[2]["text"]["type"], "mrkdwn");
    }

    #[test]
    fn fallback_text_includes_summary() {
        let payload = SlackSink::build_payload(&sample_event());
        assert_eq!(payload.text, "Minecraft Skyblock Alert: 🟢 Player Joined");
    }

    #[test]
    fn sink_name_is_slack() {
        let sink = SlackSink::new("https://hooks.slack.com/services/T/B/X", 15).unwrap();
        assert_eq!(sink.name(), "slack");
    }

    #[tokio::test]
    async fn unreachable_webhook_returns_request_failed() {
        let sink = SlackSink::new("http://127.0.0.1:9/webhook", 1).unwrap();
        let result = sink.send(&sample_event()).await;
        assert!(matches!(result, Err(NotifyError::RequestFailed { .. })));
    }
}
