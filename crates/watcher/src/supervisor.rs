//! 감시 슈퍼바이저 -- 디스커버리 스냅샷과 실행 중 태스크 집합을 일치시킵니다.
//!
//! [`WatchSupervisor`]는 core의 [`Pipeline`](craftwatch_core::pipeline::Pipeline)
//! trait을 구현하여 `craftwatch-daemon`에서 다른 모듈과 동일한 생명주기로
//! 관리됩니다.
//!
//! # 내부 아키텍처
//! ```text
//! reconcile loop -> WatchTask{tailer -> dedup -> router} x N -> mpsc -> notify
//! ```
//!
//! reconcile 틱마다 디스커버리 스냅샷을 찍어 태스크를 시작/정지합니다.
//! 양쪽에 모두 있는 서버의 태스크는 건드리지 않으므로 중복 제거 상태가
//! 유지됩니다. 스스로 종료한 태스크(읽기 불가 파일 등)는 다음 틱에
//! 감지되어 재시작되며, 다른 서버의 태스크에 영향을 주지 않습니다.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use craftwatch_core::error::CraftwatchError;
use craftwatch_core::event::NotifyEvent;
use craftwatch_core::pipeline::{HealthStatus, Pipeline};
use craftwatch_core::types::ServerInfo;

use crate::config::WatchConfig;
use crate::dedup::LineDeduplicator;
use crate::discovery;
use crate::error::WatcherError;
use crate::router::LineRouter;
use crate::tailer::LogTailer;

/// 태스크 정지 시 조인 대기 한도
const TASK_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// 슈퍼바이저 실행 상태
#[derive(Debug, Clone, PartialEq, Eq)]
enum SupervisorState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 서버 하나를 감시하는 태스크의 핸들 묶음
struct WatchTask {
    info: ServerInfo,
    cancel: CancellationToken,
    handle: JoinHandle<Result<(), WatcherError>>,
}

/// 감시 슈퍼바이저
///
/// # 사용 예시
/// ```ignore
/// use craftwatch_watcher::{WatchSupervisor, WatchSupervisorBuilder};
///
/// let (mut supervisor, notify_rx) = WatchSupervisorBuilder::new()
///     .config(config)
///     .build()?;
///
/// supervisor.start().await?;
/// ```
pub struct WatchSupervisor {
    /// 감시 설정
    config: WatchConfig,
    /// 현재 상태
    state: SupervisorState,
    /// 알림 전송 채널 (감시 태스크 -> notify)
    notify_tx: mpsc::Sender<NotifyEvent>,
    /// 루트 취소 토큰 (stop 시 발화)
    cancel: CancellationToken,
    /// reconcile 루프 태스크 핸들
    loop_handle: Option<JoinHandle<()>>,
    /// 현재 감시 중인 서버 수
    watched: Arc<AtomicUsize>,
}

impl WatchSupervisor {
    /// 현재 상태 이름을 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            SupervisorState::Initialized => "initialized",
            SupervisorState::Running => "running",
            SupervisorState::Stopped => "stopped",
        }
    }

    /// 현재 감시 중인 서버 수를 반환합니다.
    pub fn watched_count(&self) -> usize {
        self.watched.load(Ordering::Relaxed)
    }
}

impl Pipeline for WatchSupervisor {
    async fn start(&mut self) -> Result<(), CraftwatchError> {
        if self.state == SupervisorState::Running {
            return Err(WatcherError::AlreadyRunning.into());
        }

        tracing::info!(
            servers_dir = %self.config.servers_dir.display(),
            scan_interval_secs = self.config.scan_interval_secs,
            "starting watch supervisor"
        );

        let config = self.config.clone();
        let notify_tx = self.notify_tx.clone();
        let cancel = self.cancel.clone();
        let watched = Arc::clone(&self.watched);

        self.loop_handle = Some(tokio::spawn(reconcile_loop(
            config, notify_tx, cancel, watched,
        )));

        self.state = SupervisorState::Running;
        tracing::info!("watch supervisor started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), CraftwatchError> {
        if self.state != SupervisorState::Running {
            return Err(WatcherError::NotRunning.into());
        }

        tracing::info!("stopping watch supervisor");
        self.cancel.cancel();

        if let Some(handle) = self.loop_handle.take()
            && tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .is_err()
        {
            tracing::warn!("reconcile loop did not stop within 5s");
        }

        self.state = SupervisorState::Stopped;
        self.watched.store(0, Ordering::Relaxed);
        tracing::info!("watch supervisor stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            SupervisorState::Running => {
                if self.watched.load(Ordering::Relaxed) == 0 {
                    HealthStatus::Degraded("no servers watched".to_owned())
                } else {
                    HealthStatus::Healthy
                }
            }
            SupervisorState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            SupervisorState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 슈퍼바이저 빌더
///
/// 슈퍼바이저를 구성하고 알림 채널을 생성합니다.
pub struct WatchSupervisorBuilder {
    config: WatchConfig,
    notify_tx: Option<mpsc::Sender<NotifyEvent>>,
    notify_channel_capacity: usize,
}

impl WatchSupervisorBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: WatchConfig::default(),
            notify_tx: None,
            notify_channel_capacity: 1024,
        }
    }

    /// 감시 설정을 지정합니다.
    pub fn config(mut self, config: WatchConfig) -> Self {
        self.config = config;
        self
    }

    /// 외부 알림 전송 채널을 설정합니다.
    ///
    /// 설정하지 않으면 빌더가 새 채널을 생성합니다.
    pub fn notify_sender(mut self, tx: mpsc::Sender<NotifyEvent>) -> Self {
        self.notify_tx = Some(tx);
        self
    }

    /// 알림 채널 용량을 설정합니다 (외부 채널 미사용 시).
    pub fn notify_channel_capacity(mut self, capacity: usize) -> Self {
        self.notify_channel_capacity = capacity;
        self
    }

    /// 슈퍼바이저를 빌드합니다.
    ///
    /// # Returns
    /// - `WatchSupervisor`: 슈퍼바이저 인스턴스
    /// - `Option<mpsc::Receiver<NotifyEvent>>`: 알림 수신 채널
    ///   (외부 notify_sender를 설정한 경우 None)
    pub fn build(
        self,
    ) -> Result<(WatchSupervisor, Option<mpsc::Receiver<NotifyEvent>>), WatcherError> {
        self.config.validate()?;

        let (notify_tx, notify_rx) = if let Some(tx) = self.notify_tx {
            (tx, None)
        } else {
            let (tx, rx) = mpsc::channel(self.notify_channel_capacity);
            (tx, Some(rx))
        };

        let supervisor = WatchSupervisor {
            config: self.config,
            state: SupervisorState::Initialized,
            notify_tx,
            cancel: CancellationToken::new(),
            loop_handle: None,
            watched: Arc::new(AtomicUsize::new(0)),
        };

        Ok((supervisor, notify_rx))
    }
}

impl Default for WatchSupervisorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// reconcile 루프 -- 감시 태스크 맵을 소유하고 스냅샷과 일치시킵니다.
async fn reconcile_loop(
    config: WatchConfig,
    notify_tx: mpsc::Sender<NotifyEvent>,
    cancel: CancellationToken,
    watched: Arc<AtomicUsize>,
) {
    let mut tasks: HashMap<String, WatchTask> = HashMap::new();

    let mut interval = tokio::time::interval(Duration::from_secs(config.scan_interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                reconcile(&config, &notify_tx, &cancel, &mut tasks).await;
                watched.store(tasks.len(), Ordering::Relaxed);
            }
        }
    }

    // 정지: 모든 감시 태스크 취소 후 조인
    tracing::debug!(count = tasks.len(), "stopping all watch tasks");
    for (_, task) in tasks.drain() {
        task.cancel.cancel();
        if tokio::time::timeout(TASK_JOIN_TIMEOUT, task.handle)
            .await
            .is_err()
        {
            tracing::warn!(server_id = %task.info.id, "watch task did not stop in time");
        }
    }
}

/// 한 번의 reconcile: 종료 태스크 수거, 스냅샷 비교, 시작/정지.
async fn reconcile(
    config: &WatchConfig,
    notify_tx: &mpsc::Sender<NotifyEvent>,
    cancel: &CancellationToken,
    tasks: &mut HashMap<String, WatchTask>,
) {
    // 1. 스스로 종료한 태스크 수거 (다음 단계에서 스냅샷에 있으면 재시작됨)
    let finished: Vec<String> = tasks
        .iter()
        .filter(|(_, task)| task.handle.is_finished())
        .map(|(id, _)| id.clone())
        .collect();
    for id in finished {
        if let Some(task) = tasks.remove(&id) {
            match task.handle.await {
                Ok(Ok(())) => {
                    tracing::info!(server_id = %id, "watch task exited cleanly")
                }
                Ok(Err(e)) => {
                    tracing::warn!(server_id = %id, error = %e, "watch task failed, will restart")
                }
                Err(e) => {
                    tracing::error!(server_id = %id, error = %e, "watch task panicked, will restart")
                }
            }
        }
    }

    // 2. 디스커버리 스냅샷. 스캔 실패는 일시적일 수 있으므로 현 상태 유지.
    let snapshot = match discovery::discover(&config.servers_dir).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(error = %e, "discovery scan failed, keeping current tasks");
            return;
        }
    };

    // 3. 감시 중이지만 스냅샷에 없음 -> 정지
    let removed: Vec<String> = tasks
        .keys()
        .filter(|id| !snapshot.contains_key(*id))
        .cloned()
        .collect();
    for id in removed {
        if let Some(task) = tasks.remove(&id) {
            tracing::info!(server = %task.info, "server gone, stopping watch task");
            task.cancel.cancel();
            if tokio::time::timeout(TASK_JOIN_TIMEOUT, task.handle)
                .await
                .is_err()
            {
                tracing::warn!(server_id = %id, "watch task did not stop in time");
            }
        }
    }

    // 4. 스냅샷에 있지만 감시하지 않음 -> 시작 (양쪽에 있으면 건드리지 않음)
    for (id, info) in snapshot {
        if tasks.contains_key(&id) {
            continue;
        }

        tracing::info!(server = %info, "starting watch task");
        let task_cancel = cancel.child_token();
        let handle = tokio::spawn(watch_server(
            info.clone(),
            config.clone(),
            notify_tx.clone(),
            task_cancel.clone(),
        ));
        tasks.insert(
            id,
            WatchTask {
                info,
                cancel: task_cancel,
                handle,
            },
        );
    }
}

/// 서버 하나를 감시하는 태스크 본체.
///
/// 테일러가 내보낸 라인을 전용 중복 제거기와 라우터에 통과시켜
/// 알림 이벤트를 만듭니다. 중복 제거기는 이 태스크가 단독 소유하므로
/// 잠금이 필요 없습니다.
async fn watch_server(
    info: ServerInfo,
    config: WatchConfig,
    notify_tx: mpsc::Sender<NotifyEvent>,
    cancel: CancellationToken,
) -> Result<(), WatcherError> {
    // 태스크가 어떤 경로로든 종료되면 내부 테일러도 함께 취소
    let _drop_guard = cancel.clone().drop_guard();

    let (line_tx, mut line_rx) = mpsc::channel(config.line_channel_capacity);
    let tailer = LogTailer::new(info.clone(), &config, line_tx);
    let tail_handle = tokio::spawn(tailer.run(cancel.clone()));

    let mut dedup = LineDeduplicator::new(config.dedup_window_secs);
    let router = LineRouter::with_defaults();

    while let Some(event) = line_rx.recv().await {
        if !dedup.is_unique(&event.line) {
            tracing::debug!(
                server_id = %event.server_id,
                line = %event.line,
                "duplicate line suppressed"
            );
            continue;
        }

        if let Some(notification) = router.route(&event.server_name, &event.line) {
            tracing::info!(
                server_id = %event.server_id,
                category = %notification.category,
                "notification generated"
            );
            let notify_event = NotifyEvent::with_trace(notification, event.metadata.trace_id);
            notify_tx
                .send(notify_event)
                .await
                .map_err(|_| WatcherError::Channel("notify receiver closed".to_owned()))?;
        }
    }

    // 송신측이 닫힘 = 테일러 종료. 결과를 그대로 전파.
    match tail_handle.await {
        Ok(result) => result,
        Err(e) => Err(WatcherError::Channel(format!("tailer task join: {e}"))),
    }
}
