//! The read-only view of the battlefield handed to a bot on its turn.
//!
//! An [`Observation`] is a copy of the field's cells taken just before the
//! bot is invoked. Nothing the bot does can reach back into the live field
//! through it; actions go through the collector instead.

use serde::{Deserialize, Serialize};

use crate::enums::Cell;
use crate::ids::ActorId;

/// What one actor can see at the start of its turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// The observing actor.
    pub actor_id: ActorId,
    /// Current round number (counted from 1).
    pub round: u64,
    /// Number of actors that started the battle.
    pub number_of_actors: u32,
    /// The observing actor's position, or `None` if it is eliminated.
    pub my_position: Option<usize>,
    /// Copy of every cell of the field.
    pub cells: Vec<Cell>,
}

impl Observation {
    /// The observing actor's position, if it is still on the field.
    pub const fn my_position(&self) -> Option<usize> {
        self.my_position
    }

    /// The round being played.
    pub const fn round(&self) -> u64 {
        self.round
    }

    /// Number of actors that started the battle.
    pub const fn number_of_actors(&self) -> u32 {
        self.number_of_actors
    }

    /// Number of cells on the field.
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// Content of the cell at `position`, or `None` when out of range.
    pub fn cell_at(&self, position: i64) -> Option<Cell> {
        let index = usize::try_from(position).ok()?;
        self.cells.get(index).copied()
    }

    /// Which actor stands at `position`, if any.
    pub fn who_is_at(&self, position: i64) -> Option<ActorId> {
        self.cell_at(position).and_then(Cell::occupant)
    }

    /// First position of another actor, scanning forward from the
    /// observer's own position and wrapping around the end of the field.
    pub fn nearest_enemy_ahead(&self) -> Option<usize> {
        let start = self.my_position?;
        let size = self.size();
        (1..size)
            .filter_map(|step| start.checked_add(step)?.checked_rem(size))
            .find(|&pos| {
                self.cells
                    .get(pos)
                    .and_then(|cell| cell.occupant())
                    .is_some_and(|id| id != self.actor_id)
            })
    }
}
