//! Decision source trait and idle implementation.
//!
//! Each round, the scheduler presents every living actor with an
//! [`Observation`] and an [`ActionCollector`] bound to that actor. The
//! [`DecisionSource`] trait abstracts where the decisions come from: a
//! scripted bot, a native strategy, a human, or a test stub. Invocation is
//! a plain synchronous call; a source that never returns stalls the battle.

use botarena_types::{Action, ActorId, DecisionResult, Observation};
use tracing::debug;

/// Errors that can occur during the decision phase.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    /// The actor's logic raised an error this turn.
    #[error("actor {actor_id} failed: {message}")]
    Raised {
        /// The failing actor.
        actor_id: ActorId,
        /// Description of the failure.
        message: String,
    },

    /// The source has no logic for this actor.
    #[error("no decision logic for actor {actor_id}")]
    UnknownActor {
        /// The actor without logic.
        actor_id: ActorId,
    },

    /// An internal error in the decision source.
    #[error("decision source error: {message}")]
    Internal {
        /// Description of the error.
        message: String,
    },
}

/// Collects the actions one actor requests during one turn.
///
/// The collector is bound to its actor, so a bot can only ever request
/// actions for itself. Requests are recorded in order and applied later,
/// after every actor has decided.
#[derive(Debug)]
pub struct ActionCollector {
    result: DecisionResult,
}

impl ActionCollector {
    /// An empty collector for `actor_id`.
    pub const fn new(actor_id: ActorId) -> Self {
        Self {
            result: DecisionResult::new(actor_id),
        }
    }

    /// The actor this collector belongs to.
    pub const fn actor_id(&self) -> ActorId {
        self.result.actor_id
    }

    /// Request a move to the next free cell.
    pub fn move_forward(&mut self) {
        let action = Action::moving(self.actor_id());
        self.result.actions.push(action);
    }

    /// Request a shot at `target`.
    pub fn fire(&mut self, target: i64) {
        let action = Action::fire(self.actor_id(), target);
        self.result.actions.push(action);
    }

    /// Request a hazard at `target`.
    pub fn place_hazard(&mut self, target: i64) {
        let action = Action::place_hazard(self.actor_id(), target);
        self.result.actions.push(action);
    }

    /// Emit a log line on behalf of the actor.
    pub fn log(&self, message: &str) {
        debug!(actor = %self.actor_id(), "{message}");
    }

    /// Number of actions requested so far.
    pub fn len(&self) -> usize {
        self.result.actions.len()
    }

    /// Whether nothing has been requested yet.
    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }

    /// Finish collecting and hand over the result.
    pub fn into_result(self) -> DecisionResult {
        self.result
    }
}

/// A source of actor decisions.
///
/// The scheduler calls [`decide`] once per living actor per round, in
/// ascending actor order, and discards everything the actor collected if
/// the call returns an error.
///
/// [`decide`]: DecisionSource::decide
pub trait DecisionSource {
    /// Number of actors this source has logic for. Actor ids are
    /// `0..actor_count()`.
    fn actor_count(&self) -> u32;

    /// Let `actor` decide its actions for `round`.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError`] if the actor's logic fails this turn. The
    /// battle continues without that actor's actions.
    fn decide(
        &mut self,
        actor: ActorId,
        round: u64,
        observation: &Observation,
        actions: &mut ActionCollector,
    ) -> Result<(), DecisionError>;
}

/// A decision source whose actors never do anything.
#[derive(Debug, Clone, Default)]
pub struct IdleDecisionSource {
    actors: u32,
}

impl IdleDecisionSource {
    /// Create an idle source for `actors` actors.
    pub const fn new(actors: u32) -> Self {
        Self { actors }
    }
}

impl DecisionSource for IdleDecisionSource {
    fn actor_count(&self) -> u32 {
        self.actors
    }

    fn decide(
        &mut self,
        actor: ActorId,
        _round: u64,
        _observation: &Observation,
        _actions: &mut ActionCollector,
    ) -> Result<(), DecisionError> {
        if actor.into_inner() >= self.actors {
            return Err(DecisionError::UnknownActor { actor_id: actor });
        }
        Ok(())
    }
}
