//! Shared type definitions for the Bot Arena battle simulation.
//!
//! This crate holds the plain values that flow between the battle engine
//! and the bots: identifiers, cells, actions, the per-turn observation, and
//! the snapshot published to listeners.
//!
//! # Modules
//!
//! - [`ids`] -- The [`ActorId`] newtype
//! - [`enums`] -- [`ActionKind`] and the [`Cell`] variant
//! - [`actions`] -- Actions and per-turn decision results
//! - [`observation`] -- Read-only field view handed to a bot
//! - [`structs`] -- Action history and snapshots

pub mod actions;
pub mod enums;
pub mod ids;
pub mod observation;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use actions::{Action, Command, DecisionResult};
pub use enums::{ActionKind, Cell};
pub use ids::ActorId;
pub use observation::Observation;
pub use structs::{ActionHistory, Snapshot};
