//! Enumeration types for the Bot Arena simulation.

use serde::{Deserialize, Serialize};

use crate::ids::ActorId;

/// The kind of an action, used as the key of the action history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Step forward to the next free (or mined) cell.
    Move,
    /// Shoot at a cell, clearing whatever is there.
    Fire,
    /// Drop a hazard on an empty cell.
    PlaceHazard,
}

impl ActionKind {
    /// All action kinds, in display order.
    pub const ALL: [Self; 3] = [Self::Move, Self::Fire, Self::PlaceHazard];
}

impl core::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Move => "MOVE",
            Self::Fire => "FIRE",
            Self::PlaceHazard => "HAZARD",
        };
        f.write_str(name)
    }
}

/// Content of one cell of the circular battlefield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Nothing here.
    #[default]
    Empty,
    /// A live actor stands here.
    Occupant(ActorId),
    /// A hazard (mine) lies here. Lethal to whoever moves onto it.
    Hazard,
}

impl Cell {
    /// Glyph used in the textual field representation.
    pub fn symbol(self) -> char {
        match self {
            Self::Empty => '-',
            Self::Hazard => '#',
            Self::Occupant(id) => id.glyph(),
        }
    }

    /// The occupant of this cell, if any.
    pub const fn occupant(self) -> Option<ActorId> {
        match self {
            Self::Occupant(id) => Some(id),
            Self::Empty | Self::Hazard => None,
        }
    }

    /// Whether a moving actor may step onto this cell.
    pub const fn is_enterable(self) -> bool {
        matches!(self, Self::Empty | Self::Hazard)
    }
}
