//! 알림 디스패처 -- 알림 이벤트를 모든 싱크로 팬아웃합니다.
//!
//! [`NotifyDispatcher`]는 core의 [`Pipeline`](craftwatch_core::pipeline::Pipeline)
//! trait을 구현하여 `craftwatch-daemon`에서 다른 모듈과 동일한 생명주기로
//! 관리됩니다.
//!
//! # 전송 정책
//! 전송은 at-most-once입니다. 싱크 실패는 warn 로그만 남기고 버립니다.
//! 재시도 큐나 백오프는 없습니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use craftwatch_core::config::NotifyConfig;
use craftwatch_core::error::{CraftwatchError, NotifyError};
use craftwatch_core::event::NotifyEvent;
use craftwatch_core::pipeline::{HealthStatus, Pipeline};

use crate::pushover::PushoverSink;
use crate::sink::NotifySink;
use crate::slack::SlackSink;

/// 디스패처 실행 상태
#[derive(Debug, Clone, PartialEq, Eq)]
enum DispatcherState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 알림 디스패처
///
/// # 사용 예시
/// ```ignore
/// use craftwatch_notify::NotifyDispatcherBuilder;
///
/// let (mut dispatcher, _) = NotifyDispatcherBuilder::new()
///     .config(config.notify.clone())
///     .receiver(notify_rx)
///     .build()?;
///
/// dispatcher.start().await?;
/// ```
pub struct NotifyDispatcher {
    /// 설정된 싱크 목록
    sinks: Vec<Arc<dyn NotifySink>>,
    /// 알림 수신 채널 (start 시 소비)
    notify_rx: Option<mpsc::Receiver<NotifyEvent>>,
    /// 현재 상태
    state: DispatcherState,
    /// 취소 토큰 (stop 시 발화)
    cancel: CancellationToken,
    /// 디스패치 루프 핸들
    loop_handle: Option<JoinHandle<()>>,
    /// 처리한 이벤트 수
    dispatched: Arc<AtomicU64>,
}

impl NotifyDispatcher {
    /// 현재 상태 이름을 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            DispatcherState::Initialized => "initialized",
            DispatcherState::Running => "running",
            DispatcherState::Stopped => "stopped",
        }
    }

    /// 설정된 싱크 수를 반환합니다.
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// 처리한 이벤트 수를 반환합니다.
    pub fn dispatched_count(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }
}

impl Pipeline for NotifyDispatcher {
    async fn start(&mut self) -> Result<(), CraftwatchError> {
        if self.state == DispatcherState::Running {
            return Err(CraftwatchError::Notify(NotifyError::RequestFailed {
                sink: "dispatcher".to_owned(),
                reason: "already running".to_owned(),
            }));
        }

        let Some(rx) = self.notify_rx.take() else {
            return Err(CraftwatchError::Notify(NotifyError::NotConfigured {
                sink: "dispatcher receiver".to_owned(),
            }));
        };

        tracing::info!(sinks = self.sinks.len(), "starting notify dispatcher");

        let sinks = self.sinks.clone();
        let cancel = self.cancel.clone();
        let dispatched = Arc::clone(&self.dispatched);
        self.loop_handle = Some(tokio::spawn(dispatch_loop(rx, sinks, cancel, dispatched)));

        self.state = DispatcherState::Running;
        tracing::info!("notify dispatcher started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), CraftwatchError> {
        if self.state != DispatcherState::Running {
            return Err(CraftwatchError::Notify(NotifyError::RequestFailed {
                sink: "dispatcher".to_owned(),
                reason: "not running".to_owned(),
            }));
        }

        tracing::info!("stopping notify dispatcher");
        self.cancel.cancel();

        if let Some(handle) = self.loop_handle.take()
            && tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .is_err()
        {
            tracing::warn!("dispatch loop did not stop within 5s");
        }

        self.state = DispatcherState::Stopped;
        tracing::info!("notify dispatcher stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            DispatcherState::Running => {
                if self.sinks.is_empty() {
                    HealthStatus::Degraded("no sinks configured, logging only".to_owned())
                } else {
                    HealthStatus::Healthy
                }
            }
            DispatcherState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            DispatcherState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 디스패치 루프 -- 이벤트를 받아 모든 싱크로 동시에 팬아웃합니다.
async fn dispatch_loop(
    mut rx: mpsc::Receiver<NotifyEvent>,
    sinks: Vec<Arc<dyn NotifySink>>,
    cancel: CancellationToken,
    dispatched: Arc<AtomicU64>,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = rx.recv() => match event {
                Some(event) => event,
                None => {
                    tracing::debug!("notify channel closed, dispatch loop ending");
                    break;
                }
            }
        };

        dispatched.fetch_add(1, Ordering::Relaxed);

        if sinks.is_empty() {
            // 싱크 미설정: 알림을 로그로 대체
            tracing::info!(notification = %event.notification, "notification (no sinks)");
            continue;
        }

        for sink in &sinks {
            let sink = Arc::clone(sink);
            let event = event.clone();
            tokio::spawn(async move {
                if let Err(e) = sink.send(&event).await {
                    tracing::warn!(
                        sink = sink.name(),
                        event_id = %event.id,
                        error = %e,
                        "notification delivery failed"
                    );
                }
            });
        }
    }
}

/// 디스패처 빌더
pub struct NotifyDispatcherBuilder {
    config: NotifyConfig,
    notify_rx: Option<mpsc::Receiver<NotifyEvent>>,
    extra_sinks: Vec<Arc<dyn NotifySink>>,
}

impl NotifyDispatcherBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: NotifyConfig::default(),
            notify_rx: None,
            extra_sinks: Vec::new(),
        }
    }

    /// 알림 설정을 지정합니다.
    pub fn config(mut self, config: NotifyConfig) -> Self {
        self.config = config;
        self
    }

    /// 알림 수신 채널을 연결합니다 (필수).
    pub fn receiver(mut self, rx: mpsc::Receiver<NotifyEvent>) -> Self {
        self.notify_rx = Some(rx);
        self
    }

    /// 설정 외의 싱크를 추가합니다 (테스트용 훅 포함).
    pub fn sink(mut self, sink: Arc<dyn NotifySink>) -> Self {
        self.extra_sinks.push(sink);
        self
    }

    /// 디스패처를 빌드합니다.
    ///
    /// 자격증명이 비어 있는 싱크는 조용히 제외됩니다. 싱크가 하나도 없어도
    /// 에러가 아니며, 알림은 로그로만 남습니다.
    pub fn build(self) -> Result<NotifyDispatcher, NotifyError> {
        let mut sinks = self.extra_sinks;

        if self.config.slack_webhook_url.is_empty() {
            tracing::info!("slack webhook not configured, sink disabled");
        } else {
            sinks.push(Arc::new(SlackSink::new(
                &self.config.slack_webhook_url,
                self.config.timeout_secs,
            )?));
        }

        if self.config.pushover_token.is_empty() || self.config.pushover_user.is_empty() {
            tracing::info!("pushover credentials not configured, sink disabled");
        } else {
            sinks.push(Arc::new(PushoverSink::new(
                &self.config.pushover_token,
                &self.config.pushover_user,
                self.config.timeout_secs,
            )?));
        }

        Ok(NotifyDispatcher {
            sinks,
            notify_rx: self.notify_rx,
            state: DispatcherState::Initialized,
            cancel: CancellationToken::new(),
            loop_handle: None,
            dispatched: Arc::new(AtomicU64::new(0)),
        })
    }
}

impl Default for NotifyDispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
