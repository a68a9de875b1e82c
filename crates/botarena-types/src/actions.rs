//! Action and decision result types exchanged between bots and the engine.
//!
//! A bot's turn produces a [`DecisionResult`]: the ordered list of
//! [`Action`]s it asked for. Targets are signed so that a bot may aim
//! anywhere it likes; the field rejects positions outside its bounds.

use serde::{Deserialize, Serialize};

use crate::enums::ActionKind;
use crate::ids::ActorId;

/// What an actor wants to do, with the data each command needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Move forward to the next enterable cell.
    Move,
    /// Fire at the given cell.
    Fire {
        /// Target position on the field.
        target: i64,
    },
    /// Place a hazard at the given cell.
    PlaceHazard {
        /// Target position on the field.
        target: i64,
    },
}

impl Command {
    /// The kind of this command.
    pub const fn kind(self) -> ActionKind {
        match self {
            Self::Move => ActionKind::Move,
            Self::Fire { .. } => ActionKind::Fire,
            Self::PlaceHazard { .. } => ActionKind::PlaceHazard,
        }
    }

    /// The target position, if the command has one.
    pub const fn target(self) -> Option<i64> {
        match self {
            Self::Move => None,
            Self::Fire { target } | Self::PlaceHazard { target } => Some(target),
        }
    }
}

/// A single action requested by an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    /// The actor performing the action.
    pub actor_id: ActorId,
    /// What to do.
    pub command: Command,
}

impl Action {
    /// A move action.
    pub const fn moving(actor_id: ActorId) -> Self {
        Self {
            actor_id,
            command: Command::Move,
        }
    }

    /// A fire action aimed at `target`.
    pub const fn fire(actor_id: ActorId, target: i64) -> Self {
        Self {
            actor_id,
            command: Command::Fire { target },
        }
    }

    /// A hazard placement at `target`.
    pub const fn place_hazard(actor_id: ActorId, target: i64) -> Self {
        Self {
            actor_id,
            command: Command::PlaceHazard { target },
        }
    }

    /// The kind of this action.
    pub const fn kind(&self) -> ActionKind {
        self.command.kind()
    }
}

/// The actions one actor requested during one round, in request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionResult {
    /// The actor that produced these actions.
    pub actor_id: ActorId,
    /// Requested actions in the order they were requested.
    pub actions: Vec<Action>,
}

impl DecisionResult {
    /// An empty result for `actor_id`.
    pub const fn new(actor_id: ActorId) -> Self {
        Self {
            actor_id,
            actions: Vec::new(),
        }
    }

    /// A result carrying `actions` for `actor_id`.
    pub const fn with_actions(actor_id: ActorId, actions: Vec<Action>) -> Self {
        Self { actor_id, actions }
    }

    /// Whether the actor requested nothing.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn command_kind_and_target() {
        assert_eq!(Command::Move.kind(), ActionKind::Move);
        assert_eq!(Command::Move.target(), None);
        assert_eq!(Command::Fire { target: 4 }.target(), Some(4));
        assert_eq!(
            Command::PlaceHazard { target: -1 }.kind(),
            ActionKind::PlaceHazard
        );
    }

    #[test]
    fn action_serializes_with_tagged_command() {
        let action = Action::fire(ActorId::new(1), 5);
        let json = serde_json::to_value(action).unwrap();
        assert_eq!(json["actor_id"], 1);
        assert_eq!(json["command"]["Fire"]["target"], 5);
    }
}
