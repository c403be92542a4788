//! Pushover 싱크 -- messages API로 폼 인코딩 페이로드를 전송합니다.

use std::time::Duration;

use reqwest::Client;

use craftwatch_core::error::NotifyError;
use craftwatch_core::event::NotifyEvent;
use craftwatch_core::pipeline::BoxFuture;
use craftwatch_core::types::EventCategory;

use crate::sink::NotifySink;

/// Pushover messages API 엔드포인트
const PUSHOVER_API_URL: &str = "https://api.pushover.net/1/messages.json";

/// Pushover 싱크
pub struct PushoverSink {
    token: String,
    user: String,
    api_url: String,
    client: Client,
}

impl PushoverSink {
    /// 새 Pushover 싱크를 생성합니다.
    pub fn new(
        token: impl Into<String>,
        user: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| NotifyError::RequestFailed {
                sink: "pushover".to_owned(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            token: token.into(),
            user: user.into(),
            api_url: PUSHOVER_API_URL.to_owned(),
            client,
        })
    }

    /// API 엔드포인트를 교체합니다 (테스트용).
    #[cfg(test)]
    fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// 카테고리별 알림음을 고릅니다. `None`이면 수신자 기본음.
    fn sound_for(category: EventCategory) -> Option<&'static str> {
        match category {
            EventCategory::ServerFatal => Some("siren"),
            EventCategory::ServerError => Some("falling"),
            _ => None,
        }
    }
}

impl NotifySink for PushoverSink {
    fn name(&self) -> &'static str {
        "pushover"
    }

    fn send<'a>(&'a self, event: &'a NotifyEvent) -> BoxFuture<'a, Result<(), NotifyError>> {
        Box::pin(async move {
            let notification = &event.notification;
            let title = format!("Minecraft {}", notification.server_name);

            let mut form: Vec<(&str, &str)> = vec![
                ("token", &self.token),
                ("user", &self.user),
                ("title", &title),
                ("message", &notification.message),
                ("priority", "1"),
            ];
            if let Some(sound) = Self::sound_for(notification.category) {
                form.push(("sound", sound));
            }

            let response = self
                .client
                .post(&self.api_url)
                .form(&form)
                .send()
                .await
                .map_err(|e| NotifyError::RequestFailed {
                    sink: "pushover".to_owned(),
                    reason: e.to_string(),
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(NotifyError::Rejected {
                    sink: "pushover".to_owned(),
                    status: status.as_u16(),
                    body,
                });
            }

            tracing::debug!(event_id = %event.id, "pushover notification sent");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use craftwatch_core::types::Notification;

    fn sample_event(category: EventCategory) -> NotifyEvent {
        NotifyEvent::new(Notification {
            server_name: "Skyblock".to_owned(),
            message: "🛑 Out of memory".to_owned(),
            category,
        })
    }

    #[test]
    fn fatal_and_error_have_sounds() {
        assert_eq!(
            PushoverSink::sound_for(EventCategory::ServerFatal),
            Some("siren")
        );
        assert_eq!(
            PushoverSink::sound_for(EventCategory::ServerError),
            Some("falling")
        );
        assert_eq!(PushoverSink::sound_for(EventCategory::PlayerJoined), None);
        assert_eq!(PushoverSink::sound_for(EventCategory::ServerReady), None);
    }

    #[test]
    fn sink_name_is_pushover() {
        let sink = PushoverSink::new("app-token", "user-key", 15).unwrap();
        assert_eq!(sink.name(), "pushover");
    }

    #[tokio::test]
    async fn unreachable_api_returns_request_failed() {
        let sink = PushoverSink::new("app-token", "user-key", 1)
            .unwrap()
            .with_api_url("http://127.0.0.1:9/messages.json");
        let result = sink.send(&sample_event(EventCategory::ServerFatal)).await;
        assert!(matches!(result, Err(NotifyError::RequestFailed { .. })));
    }
}
