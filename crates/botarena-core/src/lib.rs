//! Battle engine core for the Bot Arena simulation.
//!
//! This crate owns the circular battlefield and the round loop that drives
//! a battle: every round each living actor decides, the decisions are
//! merged fairly, applied under a per-round quota, and a snapshot of the
//! field is published after every applied action.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `botarena-config.yaml` into
//!   strongly-typed structs.
//! - [`control`] -- Shared stop flag and battle clock.
//! - [`decision`] -- [`DecisionSource`] trait and [`ActionCollector`].
//! - [`field`] -- The circular battlefield and action semantics.
//! - [`merge`] -- Fair interleaving of per-actor actions and quotas.
//! - [`publisher`] -- Asynchronous snapshot delivery to a listener.
//! - [`report`] -- Final statistics text.
//! - [`round`] -- Round counter.
//! - [`scheduler`] -- The round loop.
//! - [`session`] -- One battle from setup to teardown.
//!
//! [`DecisionSource`]: decision::DecisionSource
//! [`ActionCollector`]: decision::ActionCollector

pub mod config;
pub mod control;
pub mod decision;
pub mod field;
pub mod merge;
pub mod publisher;
pub mod report;
pub mod round;
pub mod scheduler;
pub mod session;
