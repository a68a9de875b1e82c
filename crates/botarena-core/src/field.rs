//! The circular battlefield.
//!
//! A [`Field`] is a ring of [`Cell`]s, `actors * space_per_actor` long. It
//! owns every positional fact of a battle and is mutated only through
//! [`Field::apply_action`], one action at a time, by the scheduler.
//!
//! # Action semantics
//!
//! - **Move** scans forward from the actor's cell, wrapping past the end
//!   back to index 0, for the first cell that is empty or holds a hazard.
//!   An empty cell is occupied; a hazard kills the actor and is consumed.
//!   If every other cell is occupied the move does nothing.
//! - **Fire** clears whatever is at the target cell: an actor (possibly the
//!   shooter itself) or a hazard. Firing at an empty cell does nothing.
//! - **Place hazard** mines an empty cell; anything else is left alone.
//!
//! Targets outside `[0, size)` and actions of eliminated actors are
//! dropped before dispatch and leave no trace in the history. Every other
//! action counts toward [`ActionHistory`], including ones that turn out to
//! be no-ops.

use std::collections::BTreeMap;

use botarena_types::{Action, ActionHistory, ActorId, Cell, Command, Observation, Snapshot};
use rand::Rng;
use serde::Deserialize;
use tracing::{debug, info};

/// Errors that can occur while building a field.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    /// A battle needs at least one actor.
    #[error("a battle needs at least one actor")]
    NoActors,

    /// Space per actor must be at least one cell.
    #[error("space per actor must be at least 1")]
    InvalidSpacing,

    /// The requested field would not fit in memory addressing.
    #[error("field size overflow: {actors} actors x {space_per_actor} cells")]
    SizeOverflow {
        /// Requested number of actors.
        actors: u32,
        /// Requested cells per actor.
        space_per_actor: u32,
    },

    /// A prepared layout has no cells.
    #[error("a field needs at least one cell")]
    EmptyLayout,

    /// A prepared layout places the same actor twice.
    #[error("actor {0} appears more than once in the layout")]
    DuplicateOccupant(ActorId),

    /// A prepared layout names an actor outside `0..number_of_actors`.
    #[error("actor {actor} is not one of the {number_of_actors} actors")]
    UnknownActor {
        /// The offending actor.
        actor: ActorId,
        /// Declared number of actors.
        number_of_actors: u32,
    },
}

/// How actors are placed when the field is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Distinct cells drawn uniformly at random.
    #[default]
    Random,
    /// Actor `i` starts at cell `i * space_per_actor`.
    Spaced,
}

/// What applying a single action did to the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The actor was already eliminated; nothing happened.
    ActorAbsent,
    /// The target lies outside the field; nothing happened.
    OutOfRange {
        /// The rejected target.
        target: i64,
    },
    /// The actor moved.
    Moved {
        /// Cell the actor left.
        from: usize,
        /// Cell the actor now occupies.
        to: usize,
    },
    /// The actor moved onto a hazard and was destroyed with it.
    SteppedOnHazard {
        /// The destroyed actor.
        actor: ActorId,
        /// Cell of the consumed hazard.
        at: usize,
    },
    /// Every other cell is occupied; the actor stayed put.
    Blocked,
    /// A shot destroyed an actor.
    Killed {
        /// The destroyed actor.
        victim: ActorId,
        /// Cell that was hit.
        at: usize,
        /// The shooter hit itself.
        suicide: bool,
    },
    /// A shot destroyed a hazard.
    Defused {
        /// Cell that was hit.
        at: usize,
    },
    /// A shot hit an empty cell.
    MissedEmpty {
        /// Cell that was hit.
        at: usize,
    },
    /// A hazard was placed.
    HazardPlaced {
        /// Mined cell.
        at: usize,
    },
    /// The hazard target was not empty.
    CellTaken {
        /// Cell that was not empty.
        at: usize,
    },
}

impl ActionOutcome {
    /// The actor removed from the field by this action, if any.
    pub const fn eliminated(&self) -> Option<ActorId> {
        match self {
            Self::SteppedOnHazard { actor, .. } => Some(*actor),
            Self::Killed { victim, .. } => Some(*victim),
            _ => None,
        }
    }

    /// Whether the action got past validation and was dispatched.
    pub const fn was_dispatched(&self) -> bool {
        !matches!(self, Self::ActorAbsent | Self::OutOfRange { .. })
    }
}

/// The circular battlefield.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Every cell, left to right.
    cells: Vec<Cell>,
    /// Position of every live actor. Mirrors the occupants in `cells`.
    positions: BTreeMap<ActorId, usize>,
    /// Number of actors the battle started with.
    number_of_actors: u32,
    /// Processed-action counts.
    history: ActionHistory,
}

impl Field {
    /// Create a field for `number_of_actors` actors with `space_per_actor`
    /// cells each, placing every actor on its own cell.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::NoActors`] for zero actors,
    /// [`FieldError::InvalidSpacing`] for zero spacing, or
    /// [`FieldError::SizeOverflow`] if the size does not fit in `usize`.
    pub fn new<R: Rng + ?Sized>(
        number_of_actors: u32,
        space_per_actor: u32,
        placement: Placement,
        rng: &mut R,
    ) -> Result<Self, FieldError> {
        if number_of_actors == 0 {
            return Err(FieldError::NoActors);
        }
        if space_per_actor == 0 {
            return Err(FieldError::InvalidSpacing);
        }
        let overflow = || FieldError::SizeOverflow {
            actors: number_of_actors,
            space_per_actor,
        };
        let actors = usize::try_from(number_of_actors).map_err(|_err| overflow())?;
        let spacing = usize::try_from(space_per_actor).map_err(|_err| overflow())?;
        let size = actors.checked_mul(spacing).ok_or_else(overflow)?;

        let starts: Vec<usize> = match placement {
            Placement::Spaced => (0..actors)
                .map(|i| i.checked_mul(spacing).ok_or_else(overflow))
                .collect::<Result<_, _>>()?,
            Placement::Random => rand::seq::index::sample(rng, size, actors).into_vec(),
        };

        let mut cells = vec![Cell::Empty; size];
        let mut positions = BTreeMap::new();
        for (raw, start) in (0..number_of_actors).zip(starts) {
            let actor = ActorId::new(raw);
            if let Some(cell) = cells.get_mut(start) {
                *cell = Cell::Occupant(actor);
                positions.insert(actor, start);
            }
        }

        debug!(
            actors = number_of_actors,
            size,
            ?placement,
            "Field created"
        );

        Ok(Self {
            cells,
            positions,
            number_of_actors,
            history: ActionHistory::new(),
        })
    }

    /// Build a field from a prepared layout (scenario setups and tests).
    ///
    /// Every occupant must be one of `0..number_of_actors` and appear at
    /// most once. Actors that do not appear start out eliminated.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::NoActors`], [`FieldError::EmptyLayout`],
    /// [`FieldError::UnknownActor`] or [`FieldError::DuplicateOccupant`].
    pub fn from_layout(cells: Vec<Cell>, number_of_actors: u32) -> Result<Self, FieldError> {
        if number_of_actors == 0 {
            return Err(FieldError::NoActors);
        }
        if cells.is_empty() {
            return Err(FieldError::EmptyLayout);
        }
        let mut positions = BTreeMap::new();
        for (pos, cell) in cells.iter().enumerate() {
            let Some(actor) = cell.occupant() else {
                continue;
            };
            if actor.into_inner() >= number_of_actors {
                return Err(FieldError::UnknownActor {
                    actor,
                    number_of_actors,
                });
            }
            if positions.insert(actor, pos).is_some() {
                return Err(FieldError::DuplicateOccupant(actor));
            }
        }
        Ok(Self {
            cells,
            positions,
            number_of_actors,
            history: ActionHistory::new(),
        })
    }

    /// Number of cells.
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// Number of actors the battle started with.
    pub const fn number_of_actors(&self) -> u32 {
        self.number_of_actors
    }

    /// Every actor id of the battle, ascending, alive or not.
    pub fn actor_ids(&self) -> impl Iterator<Item = ActorId> + use<> {
        (0..self.number_of_actors).map(ActorId::new)
    }

    /// Read-only access to the cells.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Position of `actor`, or `None` if eliminated.
    pub fn position_of(&self, actor: ActorId) -> Option<usize> {
        self.positions.get(&actor).copied()
    }

    /// Whether `actor` is still on the field.
    pub fn is_alive(&self, actor: ActorId) -> bool {
        self.positions.contains_key(&actor)
    }

    /// Live actors, ascending by id.
    pub fn alive_actors(&self) -> Vec<ActorId> {
        self.positions.keys().copied().collect()
    }

    /// Number of live actors.
    pub fn alive_count(&self) -> usize {
        self.positions.len()
    }

    /// Whether the battle is decided: one survivor, or none.
    pub fn is_terminal(&self) -> bool {
        self.positions.len() <= 1
    }

    /// The winner, defined iff exactly one actor remains.
    pub fn winner(&self) -> Option<ActorId> {
        if self.positions.len() == 1 {
            self.positions.keys().next().copied()
        } else {
            None
        }
    }

    /// Processed-action counts so far.
    pub const fn history(&self) -> &ActionHistory {
        &self.history
    }

    /// One character per cell: `-` empty, `#` hazard, else the occupant's
    /// glyph.
    pub fn text_representation(&self) -> String {
        self.cells.iter().map(|cell| cell.symbol()).collect()
    }

    /// Copy of the field as seen by `actor` during `round`.
    pub fn observation_for(&self, actor: ActorId, round: u64) -> Observation {
        Observation {
            actor_id: actor,
            round,
            number_of_actors: self.number_of_actors,
            my_position: self.position_of(actor),
            cells: self.cells.clone(),
        }
    }

    /// Immutable snapshot of the current state.
    pub fn snapshot(&self, round: u64, elapsed_ms: u64) -> Snapshot {
        Snapshot {
            elapsed_ms,
            round,
            winner: self.winner(),
            field: self.text_representation(),
            history: self.history.clone(),
        }
    }

    /// Apply one action and report what happened.
    pub fn apply_action(&mut self, action: &Action) -> ActionOutcome {
        let actor = action.actor_id;
        let Some(from) = self.position_of(actor) else {
            debug!(actor = %actor, kind = %action.kind(), "Action of eliminated actor ignored");
            return ActionOutcome::ActorAbsent;
        };

        let outcome = match action.command {
            Command::Move => self.apply_move(actor, from),
            Command::Fire { target } => match self.checked_target(target) {
                Some(at) => self.apply_fire(actor, at),
                None => ActionOutcome::OutOfRange { target },
            },
            Command::PlaceHazard { target } => match self.checked_target(target) {
                Some(at) => self.apply_place_hazard(at),
                None => ActionOutcome::OutOfRange { target },
            },
        };

        if outcome.was_dispatched() {
            self.history.record(actor, action.kind());
        }
        debug!(actor = %actor, kind = %action.kind(), ?outcome, "Action applied");
        outcome
    }

    /// Convert a requested target into an index, if it lies on the field.
    fn checked_target(&self, target: i64) -> Option<usize> {
        usize::try_from(target).ok().filter(|&at| at < self.cells.len())
    }

    fn apply_move(&mut self, actor: ActorId, from: usize) -> ActionOutcome {
        let size = self.cells.len();
        let destination = (1..size)
            .filter_map(|step| from.checked_add(step)?.checked_rem(size))
            .find(|&pos| self.cells.get(pos).is_some_and(|cell| cell.is_enterable()));

        let Some(to) = destination else {
            return ActionOutcome::Blocked;
        };

        self.set_cell(from, Cell::Empty);
        if self.cells.get(to) == Some(&Cell::Hazard) {
            self.set_cell(to, Cell::Empty);
            self.positions.remove(&actor);
            info!(actor = %actor, at = to, "Actor stepped on a hazard");
            ActionOutcome::SteppedOnHazard { actor, at: to }
        } else {
            self.set_cell(to, Cell::Occupant(actor));
            self.positions.insert(actor, to);
            ActionOutcome::Moved { from, to }
        }
    }

    fn apply_fire(&mut self, shooter: ActorId, at: usize) -> ActionOutcome {
        match self.cells.get(at).copied() {
            Some(Cell::Occupant(victim)) => {
                self.set_cell(at, Cell::Empty);
                self.positions.remove(&victim);
                let suicide = victim == shooter;
                if suicide {
                    info!(actor = %shooter, at, "Actor shot itself");
                } else {
                    info!(shooter = %shooter, victim = %victim, at, "Actor destroyed");
                }
                ActionOutcome::Killed {
                    victim,
                    at,
                    suicide,
                }
            }
            Some(Cell::Hazard) => {
                self.set_cell(at, Cell::Empty);
                info!(shooter = %shooter, at, "Hazard defused");
                ActionOutcome::Defused { at }
            }
            Some(Cell::Empty) | None => ActionOutcome::MissedEmpty { at },
        }
    }

    fn apply_place_hazard(&mut self, at: usize) -> ActionOutcome {
        if self.cells.get(at) == Some(&Cell::Empty) {
            self.set_cell(at, Cell::Hazard);
            ActionOutcome::HazardPlaced { at }
        } else {
            ActionOutcome::CellTaken { at }
        }
    }

    fn set_cell(&mut self, at: usize, content: Cell) {
        if let Some(cell) = self.cells.get_mut(at) {
            *cell = content;
        }
    }
}

impl core::fmt::Display for Field {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.text_representation())
    }
}
