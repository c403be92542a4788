//! Craftwatch 감시 크레이트 -- 서버 디스커버리, 로그 테일링, 중복 제거, 이벤트 라우팅
//!
//! # 모듈 구성
//!
//! - [`discovery`]: servers_dir 스캔으로 감시 대상 서버 집합 생성
//! - [`tailer`]: 단일 로그 파일의 비동기 `tail -F` (로테이션 감지 포함)
//! - [`dedup`]: 시간 윈도우 기반 라인 중복 제거
//! - [`router`]: 트리거 패턴으로 라인을 분류하여 알림 생성
//! - [`supervisor`]: 스냅샷과 태스크 집합을 일치시키는 reconcile 루프 (Pipeline 구현)
//! - [`config`]: 감시 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! discovery -> supervisor -> WatchTask{tailer -> dedup -> router} x N -> mpsc -> notify
//! ```

pub mod config;
pub mod dedup;
pub mod discovery;
pub mod error;
pub mod router;
pub mod supervisor;
pub mod tailer;

// --- 주요 타입 re-export ---

// 슈퍼바이저
pub use supervisor::{WatchSupervisor, WatchSupervisorBuilder};

// 설정
pub use config::WatchConfig;

// 에러
pub use error::WatcherError;

// 디스커버리
pub use discovery::discover;

// 중복 제거
pub use dedup::LineDeduplicator;

// 라우터
pub use router::{LineRouter, Outcome};

// 테일러
pub use tailer::LogTailer;
