//! 로그 테일러 -- 단일 로그 파일의 비동기 `tail -F`
//!
//! 파일 끝에서 시작하여 새로 추가된 완성 라인만 내보냅니다.
//!
//! # 로테이션 감지
//! - inode 변경 감지 (Crafty/logrotate의 rename 방식)
//! - 파일 크기 축소 감지 (truncation)
//! - 감지 시 새 파일을 오프셋 0부터 읽음
//!
//! 로테이션 경계에서의 순서는 "이전 파일의 남은 라인 전부, 그 다음
//! 새 파일의 라인"입니다. 이미 전달한 라인을 다시 보내지 않습니다.

use std::io::SeekFrom;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use craftwatch_core::event::LineEvent;
use craftwatch_core::types::ServerInfo;

use crate::config::WatchConfig;
use crate::error::WatcherError;

/// 읽기 버퍼 크기
const READ_CHUNK: usize = 8 * 1024;

/// 단일 로그 파일 테일러
///
/// 감시 태스크마다 하나씩 생성되어 해당 서버의 `latest.log`만 따라갑니다.
pub struct LogTailer {
    server: ServerInfo,
    poll_interval: Duration,
    max_line_length: usize,
    tx: mpsc::Sender<LineEvent>,
}

/// 열린 파일의 추적 상태
struct TailState {
    file: File,
    /// 다음 읽기 시작 오프셋 (바이트)
    offset: u64,
    /// 현재 파일의 inode (Unix 전용)
    #[cfg(unix)]
    inode: u64,
    /// 아직 개행을 만나지 못한 끝자락 조각
    partial: Vec<u8>,
    /// 현재 라인이 max_line_length를 넘겨 잘려나가는 중인지
    overflowing: bool,
}

impl LogTailer {
    /// 새 테일러를 생성합니다.
    pub fn new(server: ServerInfo, config: &WatchConfig, tx: mpsc::Sender<LineEvent>) -> Self {
        Self {
            server,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_line_length: config.max_line_length,
            tx,
        }
    }

    /// 테일링 루프를 실행합니다. 취소 토큰이 발화할 때까지 반환하지 않습니다.
    ///
    /// 파일을 열 수 없으면 에러로 종료하며, 슈퍼바이저가 다음 reconcile
    /// 틱에서 태스크를 재시작합니다.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), WatcherError> {
        let mut state = self.open_at_end().await?;

        tracing::info!(
            server_id = %self.server.id,
            log_path = %self.server.log_path.display(),
            offset = state.offset,
            "tailing log file"
        );

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(server_id = %self.server.id, "tailer cancelled");
                    return Ok(());
                }
                _ = interval.tick() => {
                    self.poll_once(&mut state).await?;
                }
            }
        }
    }

    /// 파일을 열고 끝 오프셋에서 시작하는 상태를 만듭니다 (과거 라인 재생 없음).
    async fn open_at_end(&self) -> Result<TailState, WatcherError> {
        let file = File::open(&self.server.log_path)
            .await
            .map_err(|e| WatcherError::Tail {
                server_id: self.server.id.clone(),
                reason: format!("open {}: {e}", self.server.log_path.display()),
            })?;
        let meta = file.metadata().await.map_err(|e| WatcherError::Tail {
            server_id: self.server.id.clone(),
            reason: e.to_string(),
        })?;

        Ok(TailState {
            offset: meta.len(),
            #[cfg(unix)]
            inode: {
                use std::os::unix::fs::MetadataExt;
                meta.ino()
            },
            file,
            partial: Vec::new(),
            overflowing: false,
        })
    }

    /// 한 틱 분량의 작업: 현재 파일 드레인, 로테이션 확인, 필요 시 재오픈.
    async fn poll_once(&mut self, state: &mut TailState) -> Result<(), WatcherError> {
        // 1. 열려 있는 핸들에서 새 내용을 먼저 읽음 (rename 이후에도 유효)
        self.drain(state).await?;

        // 2. 경로의 현재 메타데이터로 로테이션 판정
        let meta = match tokio::fs::metadata(&self.server.log_path).await {
            Ok(meta) => meta,
            Err(_) => {
                // 로테이션 진행 중에 잠시 사라질 수 있음, 다음 틱에 재시도
                return Ok(());
            }
        };

        if self.rotated(state, &meta) {
            tracing::info!(
                server_id = %self.server.id,
                "log rotation detected, reopening from start"
            );

            // 이전 파일의 개행 없는 끝자락은 완성 라인으로 취급
            if !state.partial.is_empty() {
                self.emit_partial(state).await?;
            }

            let file =
                File::open(&self.server.log_path)
                    .await
                    .map_err(|e| WatcherError::Tail {
                        server_id: self.server.id.clone(),
                        reason: format!("reopen after rotation: {e}"),
                    })?;
            state.file = file;
            state.offset = 0;
            state.overflowing = false;
            #[cfg(unix)]
            {
                use std::os::unix::fs::MetadataExt;
                state.inode = meta.ino();
            }

            // 새 파일에 이미 쌓인 내용을 같은 틱에 전달
            self.drain(state).await?;
        }

        Ok(())
    }

    /// 로테이션 여부를 판정합니다.
    fn rotated(&self, state: &TailState, meta: &std::fs::Metadata) -> bool {
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            if meta.ino() != state.inode {
                return true;
            }
        }
        meta.len() < state.offset
    }

    /// 현재 오프셋부터 EOF까지 읽어 완성 라인을 내보냅니다.
    async fn drain(&mut self, state: &mut TailState) -> Result<(), WatcherError> {
        state
            .file
            .seek(SeekFrom::Start(state.offset))
            .await
            .map_err(|e| WatcherError::Tail {
                server_id: self.server.id.clone(),
                reason: e.to_string(),
            })?;

        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = state
                .file
                .read(&mut buf)
                .await
                .map_err(|e| WatcherError::Tail {
                    server_id: self.server.id.clone(),
                    reason: e.to_string(),
                })?;
            if n == 0 {
                return Ok(());
            }
            state.offset += n as u64;

            for &byte in &buf[..n] {
                if byte == b'\n' {
                    self.emit_partial(state).await?;
                } else if state.partial.len() < self.max_line_length {
                    state.partial.push(byte);
                } else {
                    // 초과분은 버림: 긴 라인은 잘릴 뿐 두 개로 쪼개지지 않음
                    state.overflowing = true;
                }
            }
        }
    }

    /// 모아둔 조각을 라인 이벤트로 내보냅니다.
    async fn emit_partial(&self, state: &mut TailState) -> Result<(), WatcherError> {
        let mut bytes = std::mem::take(&mut state.partial);
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        if state.overflowing {
            tracing::warn!(
                server_id = %self.server.id,
                max = self.max_line_length,
                "line exceeded max length, truncated"
            );
            state.overflowing = false;
        }

        let line = String::from_utf8_lossy(&bytes).into_owned();
        if line.is_empty() {
            return Ok(());
        }

        let event = LineEvent::new(
            self.server.id.clone(),
            self.server.display_name.clone(),
            line,
        );
        self.tx
            .send(event)
            .await
            .map_err(|_| WatcherError::Channel("line receiver closed".to_owned()))
    }
}
