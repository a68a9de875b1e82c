//! Round counter for a battle.
//!
//! The counter starts at 0 and is advanced by exactly one immediately before
//! each round's decisions are collected, so the first round is round 1. All
//! arithmetic is checked; a battle that somehow exhausts `u64` fails loudly
//! instead of wrapping back to round 0.

/// Errors that can occur while advancing the round counter.
#[derive(Debug, thiserror::Error)]
pub enum RoundError {
    /// The round counter would overflow.
    #[error("round counter overflow: cannot advance beyond u64::MAX")]
    Overflow,
}

/// Monotonic round counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundCounter {
    /// Number of the current (or last started) round. 0 before the first.
    round: u64,
}

impl RoundCounter {
    /// Create a counter that has not started any round yet.
    pub const fn new() -> Self {
        Self { round: 0 }
    }

    /// Start the next round. Returns the new round number.
    ///
    /// # Errors
    ///
    /// Returns [`RoundError::Overflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, RoundError> {
        self.round = self.round.checked_add(1).ok_or(RoundError::Overflow)?;
        Ok(self.round)
    }

    /// The current round number (0 before the first round starts).
    pub const fn current(&self) -> u64 {
        self.round
    }
}
