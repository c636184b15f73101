//! Time sources
//!
//! The evaluator never reads the wall clock directly, so tests can drive
//! dwell and cool-down timers without sleeping.

use chrono::{DateTime, Duration, Utc};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Instant;

/// Source of monotonic milliseconds and wall-clock timestamps
pub trait Clock: Send + Sync {
    /// Monotonic milliseconds since an arbitrary origin
    fn now_ms(&self) -> u64;

    /// Wall-clock time of a monotonic instant, for event timestamps
    fn wall_time_at(&self, ms: u64) -> DateTime<Utc>;
}

/// Real clock anchored at construction
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
    origin_wall: DateTime<Utc>,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            origin_wall: Utc::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn wall_time_at(&self, ms: u64) -> DateTime<Utc> {
        offset_wall(self.origin_wall, ms)
    }
}

/// Wall time `ms` after `origin`, pinned to chrono's maximum on overflow
fn offset_wall(origin: DateTime<Utc>, ms: u64) -> DateTime<Utc> {
    let ms = ms.min(i64::MAX as u64) as i64;
    origin
        .checked_add_signed(Duration::milliseconds(ms))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Hand-driven clock. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
    origin_wall: DateTime<Utc>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Start at 0 ms, anchored to the Unix epoch
    pub fn new() -> Self {
        Self::anchored(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Start at 0 ms, anchored to `origin_wall`
    pub fn anchored(origin_wall: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(0)),
            origin_wall,
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn wall_time_at(&self, ms: u64) -> DateTime<Utc> {
        offset_wall(self.origin_wall, ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();
        clock.advance(1500);
        assert_eq!(other.now_ms(), 1500);
        other.set(42);
        assert_eq!(clock.now_ms(), 42);
    }

    #[test]
    fn test_wall_time_offsets_from_anchor() {
        let clock = ManualClock::new();
        let t = clock.wall_time_at(2000);
        assert_eq!(t.timestamp_millis(), 2000);
    }

    #[test]
    fn test_wall_time_saturates_far_future() {
        let clock = ManualClock::new();
        assert_eq!(clock.wall_time_at(u64::MAX), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
