//! 라인 중복 제거 -- 시간 윈도우 내 반복 라인을 억제합니다.
//!
//! [`LineDeduplicator`]는 타임스탬프 프리픽스를 제거한 핵심 내용을 기준으로
//! 중복을 판단합니다. 같은 내용이 초 단위로 반복되는 에러 로그가
//! 알림 채널을 범람시키는 것을 막습니다.
//!
//! 각 감시 태스크가 자기 인스턴스를 소유하므로 잠금이 필요 없습니다.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use regex::Regex;

/// 라인 선두의 대괄호 타임스탬프 토큰 (`[10:08:36]`, `[2024-01-15T10:08:36]` 등)
static TIMESTAMP_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    // 문자 클래스가 고정이므로 컴파일은 실패하지 않습니다
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^\[[\d\-:T\s]+\]\s*").unwrap()
});

/// 시간 윈도우 기반 라인 중복 제거기
///
/// `is_unique`는 호출자 관점에서 원자적인 check-and-insert입니다.
/// 윈도우는 최초 관측 시각에 고정됩니다. 중복 라인이 와도 저장된
/// 시각을 갱신하지 않으므로, 지속적으로 반복되는 라인도 윈도우가
/// 만료될 때마다 정확히 한 번씩 통과합니다.
pub struct LineDeduplicator {
    /// 중복 제거 윈도우
    window: Duration,
    /// 핵심 내용 -> 최초 관측 시각
    seen: HashMap<String, Instant>,
    /// 통과한 라인 수
    passed: u64,
    /// 억제된 라인 수
    suppressed: u64,
}

impl LineDeduplicator {
    /// 새 중복 제거기를 만듭니다. `window_secs = 0`이면 모든 라인이 통과합니다.
    pub fn new(window_secs: u64) -> Self {
        Self {
            window: Duration::from_secs(window_secs),
            seen: HashMap::new(),
            passed: 0,
            suppressed: 0,
        }
    }

    /// 윈도우 내에서 처음 보는 라인이면 true를 반환합니다.
    pub fn is_unique(&mut self, line: &str) -> bool {
        self.is_unique_at(line, Instant::now())
    }

    /// 시각을 주입할 수 있는 내부 구현 (테스트용).
    fn is_unique_at(&mut self, line: &str, now: Instant) -> bool {
        if self.window.is_zero() {
            self.passed += 1;
            return true;
        }

        // 만료된 엔트리 정리
        let window = self.window;
        self.seen
            .retain(|_, first_seen| now.duration_since(*first_seen) <= window);

        let core = normalize(line);

        if self.seen.contains_key(&core) {
            self.suppressed += 1;
            return false;
        }

        self.seen.insert(core, now);
        self.passed += 1;
        true
    }

    /// 통과한 라인 수를 반환합니다.
    pub fn passed(&self) -> u64 {
        self.passed
    }

    /// 억제된 라인 수를 반환합니다.
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }

    /// 현재 추적 중인 엔트리 수를 반환합니다.
    pub fn tracked(&self) -> usize {
        self.seen.len()
    }
}

/// 선두 타임스탬프 토큰 하나를 제거하고 공백을 정리하여
/// 중복 판정에 쓰이는 핵심 내용을 만듭니다.
fn normalize(line: &str) -> String {
    TIMESTAMP_PREFIX.replace(line, "").trim().to_owned()
}
