//! One battle from setup to teardown.
//!
//! A [`BattleSession`] ties the pieces together: it spawns the snapshot
//! consumer when created, builds the field and scheduler when run, and
//! stops the consumer when finished or shut down.
//!
//! ```text
//! create (consumer spawned) -> run (one battle) -> finish | shutdown
//! ```
//!
//! [`BattleSession::run`] blocks for the whole battle. Inside an async
//! program, move the session into `tokio::task::spawn_blocking` for the run
//! and keep its [`control`](BattleSession::control) handle to request a
//! stop from the async side.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::info;

use crate::config::BattleConfig;
use crate::control::BattleControl;
use crate::decision::DecisionSource;
use crate::field::{Field, FieldError};
use crate::publisher::{SnapshotListener, SnapshotPublisher};
use crate::scheduler::{self, BattleResult, BattleScheduler, SchedulerError};

/// Errors that can occur while running a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The field could not be built.
    #[error("field error: {source}")]
    Field {
        /// The underlying field error.
        #[from]
        source: FieldError,
    },

    /// The battle failed.
    #[error("scheduler error: {source}")]
    Scheduler {
        /// The underlying scheduler error.
        #[from]
        source: SchedulerError,
    },

    /// A session runs exactly one battle.
    #[error("session has already run its battle")]
    AlreadyRun,
}

/// A single battle with its snapshot pipeline.
#[derive(Debug)]
pub struct BattleSession {
    config: BattleConfig,
    control: Arc<BattleControl>,
    publisher: SnapshotPublisher,
    has_run: bool,
}

impl BattleSession {
    /// Set up a session and spawn the snapshot consumer driving
    /// `listener`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn create<L: SnapshotListener>(config: BattleConfig, listener: L) -> Self {
        Self {
            config,
            control: Arc::new(BattleControl::new()),
            publisher: SnapshotPublisher::spawn(listener),
            has_run: false,
        }
    }

    /// Shared control handle, for requesting a stop from elsewhere.
    pub fn control(&self) -> Arc<BattleControl> {
        Arc::clone(&self.control)
    }

    /// The battle configuration.
    pub const fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Run the battle with one actor per entry of `source`. Blocks until
    /// the battle ends.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Field`] if the field cannot be built,
    /// [`SessionError::Scheduler`] if the battle fails, or
    /// [`SessionError::AlreadyRun`] on a second call.
    pub fn run(&mut self, source: &mut dyn DecisionSource) -> Result<BattleResult, SessionError> {
        if self.has_run {
            return Err(SessionError::AlreadyRun);
        }
        self.has_run = true;

        let mut rng = match self.config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        let field = Field::new(
            source.actor_count(),
            self.config.space_per_actor,
            self.config.placement,
            &mut rng,
        )?;
        info!(field = %field, seed = ?self.config.seed, "Initial field");

        let mut scheduler = BattleScheduler::new(
            field,
            self.config.round_mode(),
            self.config.max_actions_per_round,
            rng,
            Arc::clone(&self.control),
        );
        let result = scheduler.run(source, &mut self.publisher)?;
        scheduler::log_battle_end(&result);
        Ok(result)
    }

    /// Wait until every published snapshot has reached the listener, then
    /// stop the consumer. Returns the number of snapshots delivered.
    pub async fn finish(self) -> u64 {
        self.publisher.finish().await
    }

    /// Stop the consumer without waiting for queued snapshots. Also
    /// requests a stop, in case the battle is still running elsewhere.
    pub async fn shutdown(self) -> u64 {
        self.control.request_stop();
        self.publisher.shutdown().await
    }
}
