//! Shared control state for a running battle.
//!
//! The scheduler runs on a blocking thread while the rest of the process
//! (signal handlers, the session owner) stays on the async runtime. The
//! [`BattleControl`] handle is shared between them behind an [`Arc`] and
//! read with atomics, so the scheduler never takes a lock.
//!
//! [`Arc`]: std::sync::Arc

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reason why the battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleEndReason {
    /// At most one actor is left.
    Decided,
    /// The configured number of rounds was played.
    RoundLimitReached,
    /// A stop was requested before the battle was decided.
    Stopped,
}

impl core::fmt::Display for BattleEndReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            Self::Decided => "decided",
            Self::RoundLimitReached => "round limit reached",
            Self::Stopped => "stopped",
        };
        f.write_str(text)
    }
}

/// Cooperative stop flag and battle clock.
#[derive(Debug)]
pub struct BattleControl {
    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Wall-clock time when the battle was created.
    started_at: DateTime<Utc>,
}

impl Default for BattleControl {
    fn default() -> Self {
        Self::new()
    }
}

impl BattleControl {
    /// Create control state with the clock starting now.
    pub fn new() -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            started_at: Utc::now(),
        }
    }

    /// Request a clean stop. No further decisions are requested once the
    /// scheduler notices.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Milliseconds since the battle was created.
    pub fn elapsed_ms(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_milliseconds();
        // Negative if the wall clock went backwards; treat as 0.
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_running() {
        let control = BattleControl::new();
        assert!(!control.is_stop_requested());
        assert!(control.started_at <= Utc::now());
    }

    #[test]
    fn stop_request_is_sticky() {
        let control = BattleControl::new();
        control.request_stop();
        assert!(control.is_stop_requested());
        control.request_stop();
        assert!(control.is_stop_requested());
    }

    #[test]
    fn elapsed_is_monotonic_enough() {
        let control = BattleControl::new();
        let first = control.elapsed_ms();
        let second = control.elapsed_ms();
        assert!(second >= first);
    }

    #[test]
    fn end_reason_display() {
        assert_eq!(BattleEndReason::Decided.to_string(), "decided");
        assert_eq!(BattleEndReason::Stopped.to_string(), "stopped");
    }
}
