//! Actor identifier.
//!
//! Actors are numbered densely from zero in the order their decision logic
//! was loaded. The id doubles as the actor's index in the decision source
//! and as its glyph in the textual field representation.

use serde::{Deserialize, Serialize};

/// Radix used to render an actor id as a single field glyph.
const GLYPH_RADIX: u32 = 36;

/// Unique identifier for an actor (bot) in a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u32);

impl ActorId {
    /// Create an identifier from its raw number.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Return the raw number.
    pub const fn into_inner(self) -> u32 {
        self.0
    }

    /// Return the id as a `usize` index.
    pub fn index(self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }

    /// Single-character glyph used in the textual field representation.
    ///
    /// Ids below 36 render as one base-36 digit (`0`-`9`, then `a`-`z`).
    /// Larger ids render as `*`, which keeps the field string at exactly one
    /// character per cell.
    pub fn glyph(self) -> char {
        char::from_digit(self.0, GLYPH_RADIX).unwrap_or('*')
    }
}

impl core::fmt::Display for ActorId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ActorId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<ActorId> for u32 {
    fn from(id: ActorId) -> Self {
        id.0
    }
}
