//! Round scheduler.
//!
//! [`BattleScheduler::run`] drives a battle from the first round to its
//! end. Each round:
//!
//! 1. Advance the round counter.
//! 2. Ask every living actor, in ascending id order, for its actions. An
//!    actor whose logic fails contributes nothing this round.
//! 3. Interleave all collected actions fairly.
//! 4. Apply them under the per-actor quota, publishing a snapshot after
//!    every applied action.
//!
//! How many rounds are played depends on the [`RoundMode`]:
//!
//! - **Fixed**: rounds `1..=N`, ending early once the battle is decided.
//! - **Last man standing**: until at most one actor is left.
//!
//! A stop requested through [`BattleControl`] is honoured before each round
//! and before each actor is asked; the round in progress is abandoned.

use std::sync::Arc;

use botarena_types::{ActionHistory, ActorId};
use rand::rngs::SmallRng;
use tracing::{debug, info, warn};

use crate::config::RoundMode;
use crate::control::{BattleControl, BattleEndReason};
use crate::decision::{ActionCollector, DecisionSource};
use crate::field::Field;
use crate::merge;
use crate::publisher::SnapshotSink;
use crate::round::{RoundCounter, RoundError};

/// Errors that can occur during a battle run.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The round counter failed.
    #[error("round error: {source}")]
    Round {
        /// The underlying round error.
        #[from]
        source: RoundError,
    },

    /// The decision source and the field disagree on the number of actors.
    #[error("decision source has {source_actors} actors but the field has {field_actors}")]
    ActorCountMismatch {
        /// Actors on the field.
        field_actors: u32,
        /// Actors the decision source has logic for.
        source_actors: u32,
    },

    /// The battle has already ended.
    #[error("battle already finished")]
    AlreadyFinished,
}

/// Where the scheduler is in the battle lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattlePhase {
    /// No round has started.
    NotStarted,
    /// Decisions are being collected or actions applied.
    RoundInProgress,
    /// A round finished and the next has not started.
    BetweenRounds,
    /// The battle is over.
    Terminal,
}

/// What happened during one round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundSummary {
    /// The round number.
    pub round: u64,
    /// Actors whose logic was invoked.
    pub invoked: u32,
    /// Actors whose logic failed.
    pub failed: Vec<ActorId>,
    /// Actions requested by actors that did not fail.
    pub requested: u32,
    /// Actions applied to the field.
    pub applied: u32,
    /// Actions dropped by the quota.
    pub skipped_by_quota: u32,
    /// Actors eliminated, in order.
    pub eliminated: Vec<ActorId>,
    /// Live actors at the end of the round.
    pub alive_after: u32,
    /// The round was abandoned because a stop was requested.
    pub interrupted: bool,
}

/// Result of a finished battle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleResult {
    /// Why the battle ended.
    pub end_reason: BattleEndReason,
    /// The sole survivor, if there is exactly one.
    pub winner: Option<ActorId>,
    /// Rounds started, including an abandoned one.
    pub rounds: u64,
    /// Final field text.
    pub final_field: String,
    /// Processed-action counts for the whole battle.
    pub history: ActionHistory,
    /// Actors the battle started with.
    pub number_of_actors: u32,
    /// Actors still on the field.
    pub survivors: Vec<ActorId>,
    /// Milliseconds from battle creation to the end.
    pub elapsed_ms: u64,
    /// One entry per round started, in order.
    pub summaries: Vec<RoundSummary>,
}

/// Drives the rounds of one battle.
#[derive(Debug)]
pub struct BattleScheduler {
    field: Field,
    mode: RoundMode,
    max_actions_per_round: u32,
    rng: SmallRng,
    control: Arc<BattleControl>,
    counter: RoundCounter,
    phase: BattlePhase,
}

impl BattleScheduler {
    /// Create a scheduler for `field`. `rng` drives the action merge.
    pub fn new(
        field: Field,
        mode: RoundMode,
        max_actions_per_round: u32,
        rng: SmallRng,
        control: Arc<BattleControl>,
    ) -> Self {
        Self {
            field,
            mode,
            max_actions_per_round,
            rng,
            control,
            counter: RoundCounter::new(),
            phase: BattlePhase::NotStarted,
        }
    }

    /// Current lifecycle phase.
    pub const fn phase(&self) -> BattlePhase {
        self.phase
    }

    /// Number of the current (or last) round.
    pub const fn round(&self) -> u64 {
        self.counter.current()
    }

    /// Read-only access to the field.
    pub const fn field(&self) -> &Field {
        &self.field
    }

    /// Run the battle to its end.
    ///
    /// `source` is asked for decisions; `sink` receives a snapshot after
    /// every applied action.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::ActorCountMismatch`] if `source` does not
    /// cover exactly the field's actors, [`SchedulerError::AlreadyFinished`]
    /// if called again after the battle ended, or
    /// [`SchedulerError::Round`] if the round counter overflows.
    pub fn run(
        &mut self,
        source: &mut dyn DecisionSource,
        sink: &mut dyn SnapshotSink,
    ) -> Result<BattleResult, SchedulerError> {
        if self.phase == BattlePhase::Terminal {
            return Err(SchedulerError::AlreadyFinished);
        }
        let field_actors = self.field.number_of_actors();
        let source_actors = source.actor_count();
        if field_actors != source_actors {
            return Err(SchedulerError::ActorCountMismatch {
                field_actors,
                source_actors,
            });
        }

        info!(
            actors = field_actors,
            size = self.field.size(),
            mode = ?self.mode,
            max_actions_per_round = self.max_actions_per_round,
            "Battle starting"
        );

        let mut summaries = Vec::new();
        let end_reason = loop {
            // --- Check stop request (before round) ---
            if self.control.is_stop_requested() {
                info!(round = self.counter.current(), "Stop requested");
                break BattleEndReason::Stopped;
            }

            // --- Check round bounds (before round) ---
            match self.mode {
                RoundMode::LastManStanding if self.field.is_terminal() => {
                    break BattleEndReason::Decided;
                }
                RoundMode::Fixed { rounds } if self.counter.current() >= rounds => {
                    info!(rounds, "Round limit reached");
                    break BattleEndReason::RoundLimitReached;
                }
                _ => {}
            }

            let summary = self.run_round(source, sink)?;
            let interrupted = summary.interrupted;
            summaries.push(summary);
            if interrupted {
                break BattleEndReason::Stopped;
            }

            // --- Check decision (after round) ---
            if matches!(self.mode, RoundMode::Fixed { .. }) && self.field.is_terminal() {
                break BattleEndReason::Decided;
            }
        };

        self.phase = BattlePhase::Terminal;
        Ok(BattleResult {
            end_reason,
            winner: self.field.winner(),
            rounds: self.counter.current(),
            final_field: self.field.text_representation(),
            history: self.field.history().clone(),
            number_of_actors: field_actors,
            survivors: self.field.alive_actors(),
            elapsed_ms: self.control.elapsed_ms(),
            summaries,
        })
    }

    /// Play one round.
    fn run_round(
        &mut self,
        source: &mut dyn DecisionSource,
        sink: &mut dyn SnapshotSink,
    ) -> Result<RoundSummary, SchedulerError> {
        let round = self.counter.advance()?;
        self.phase = BattlePhase::RoundInProgress;
        info!(round, alive = self.field.alive_count(), "Round started");

        let mut summary = RoundSummary {
            round,
            ..RoundSummary::default()
        };

        // --- Decision ---
        let mut results = Vec::new();
        for actor in self.field.actor_ids() {
            if self.control.is_stop_requested() {
                info!(round, next_actor = %actor, "Stop requested mid-round, round abandoned");
                summary.interrupted = true;
                return Ok(summary);
            }
            if !self.field.is_alive(actor) {
                continue;
            }

            let observation = self.field.observation_for(actor, round);
            let mut collector = ActionCollector::new(actor);
            summary.invoked = summary.invoked.saturating_add(1);

            match source.decide(actor, round, &observation, &mut collector) {
                Ok(()) => {
                    let requested = u32::try_from(collector.len()).unwrap_or(u32::MAX);
                    summary.requested = summary.requested.saturating_add(requested);
                    debug!(round, actor = %actor, requested, "Decision collected");
                    results.push(collector.into_result());
                }
                Err(err) => {
                    warn!(
                        round,
                        actor = %actor,
                        discarded = collector.len(),
                        %err,
                        "Decision failed, actor skips the round"
                    );
                    summary.failed.push(actor);
                }
            }
        }

        // --- Resolution ---
        let merged = merge::interleave(results, &mut self.rng);
        let control = &self.control;
        let report = merge::apply_with_quota(
            &mut self.field,
            &merged,
            self.max_actions_per_round,
            |field, _action, _outcome| {
                sink.publish(field.snapshot(round, control.elapsed_ms()));
            },
        );

        summary.applied = report.applied;
        summary.skipped_by_quota = report.skipped_by_quota;
        summary.eliminated = report.eliminated;
        summary.alive_after = u32::try_from(self.field.alive_count()).unwrap_or(u32::MAX);
        self.phase = BattlePhase::BetweenRounds;

        info!(
            round,
            applied = summary.applied,
            skipped_by_quota = summary.skipped_by_quota,
            failed = summary.failed.len(),
            eliminated = summary.eliminated.len(),
            alive = summary.alive_after,
            "Round finished"
        );

        Ok(summary)
    }
}

/// Log the end of a battle.
pub fn log_battle_end(result: &BattleResult) {
    info!(
        reason = %result.end_reason,
        rounds = result.rounds,
        winner = ?result.winner,
        survivors = result.survivors.len(),
        elapsed_ms = result.elapsed_ms,
        "Battle ended"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use botarena_types::{Cell, Observation, Snapshot};
    use rand::SeedableRng;

    use super::*;
    use crate::decision::{DecisionError, IdleDecisionSource};
    use crate::field::Placement;
    use crate::publisher::DiscardSnapshots;

    fn scheduler(field: Field, mode: RoundMode) -> BattleScheduler {
        BattleScheduler::new(
            field,
            mode,
            4,
            SmallRng::seed_from_u64(5),
            Arc::new(BattleControl::new()),
        )
    }

    fn spaced(actors: u32, space: u32) -> Field {
        let mut rng = SmallRng::seed_from_u64(1);
        Field::new(actors, space, Placement::Spaced, &mut rng).unwrap()
    }

    /// Every actor runs the same closure.
    struct FnSource<F> {
        actors: u32,
        logic: F,
    }

    fn scripted<F>(actors: u32, logic: F) -> FnSource<F>
    where
        F: FnMut(ActorId, u64, &Observation, &mut ActionCollector) -> Result<(), DecisionError>,
    {
        FnSource { actors, logic }
    }

    impl<F> DecisionSource for FnSource<F>
    where
        F: FnMut(ActorId, u64, &Observation, &mut ActionCollector) -> Result<(), DecisionError>,
    {
        fn actor_count(&self) -> u32 {
            self.actors
        }

        fn decide(
            &mut self,
            actor: ActorId,
            round: u64,
            observation: &Observation,
            actions: &mut ActionCollector,
        ) -> Result<(), DecisionError> {
            (self.logic)(actor, round, observation, actions)
        }
    }

    #[test]
    fn fixed_rounds_without_eliminations_runs_every_round() {
        let mut sched = scheduler(spaced(3, 10), RoundMode::Fixed { rounds: 3 });
        assert_eq!(sched.phase(), BattlePhase::NotStarted);
        let mut source = IdleDecisionSource::new(3);
        let result = sched.run(&mut source, &mut DiscardSnapshots).unwrap();
        assert_eq!(result.rounds, 3);
        assert_eq!(result.end_reason, BattleEndReason::RoundLimitReached);
        assert_eq!(result.winner, None);
        assert_eq!(result.survivors.len(), 3);
        assert_eq!(sched.phase(), BattlePhase::Terminal);
    }

    #[test]
    fn second_run_is_rejected() {
        let mut sched = scheduler(spaced(2, 5), RoundMode::Fixed { rounds: 1 });
        let mut source = IdleDecisionSource::new(2);
        sched.run(&mut source, &mut DiscardSnapshots).unwrap();
        let again = sched.run(&mut source, &mut DiscardSnapshots);
        assert!(matches!(again, Err(SchedulerError::AlreadyFinished)));
    }

    #[test]
    fn actor_count_mismatch_is_rejected() {
        let mut sched = scheduler(spaced(2, 5), RoundMode::LastManStanding);
        let mut source = IdleDecisionSource::new(3);
        let result = sched.run(&mut source, &mut DiscardSnapshots);
        assert!(matches!(
            result,
            Err(SchedulerError::ActorCountMismatch {
                field_actors: 2,
                source_actors: 3
            })
        ));
        assert_eq!(sched.round(), 0);
    }

    #[test]
    fn fixed_mode_stops_early_when_decided() {
        let mut sched = scheduler(spaced(2, 5), RoundMode::Fixed { rounds: 10 });
        let mut source = scripted(2, |actor, _round, _obs, actions| {
            if actor == ActorId::new(0) {
                actions.fire(5);
            }
            Ok(())
        });
        let mut snapshots: Vec<Snapshot> = Vec::new();
        let result = sched.run(&mut source, &mut snapshots).unwrap();
        assert_eq!(result.rounds, 1);
        assert_eq!(result.end_reason, BattleEndReason::Decided);
        assert_eq!(result.winner, Some(ActorId::new(0)));
        assert_eq!(result.final_field, "0---------");
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots.first().unwrap().winner, Some(ActorId::new(0)));
    }

    #[test]
    fn snapshot_after_every_applied_action() {
        let mut sched = scheduler(spaced(2, 10), RoundMode::Fixed { rounds: 2 });
        let mut source = scripted(2, |_actor, _round, _obs, actions| {
            for _ in 0..6 {
                actions.move_forward();
            }
            Ok(())
        });
        let mut snapshots: Vec<Snapshot> = Vec::new();
        let result = sched.run(&mut source, &mut snapshots).unwrap();
        // Two actors, quota of four, two rounds.
        assert_eq!(snapshots.len(), 16);
        assert_eq!(snapshots.iter().filter(|s| s.round == 1).count(), 8);
        assert_eq!(result.history.total_for(ActorId::new(0)), 8);
        assert_eq!(result.history.total_for(ActorId::new(1)), 8);
    }

    #[test]
    fn failing_actor_contributes_nothing() {
        let mut sched = scheduler(spaced(2, 5), RoundMode::Fixed { rounds: 2 });
        let mut source = scripted(2, |actor, _round, _obs, actions| {
            actions.move_forward();
            if actor == ActorId::new(1) {
                return Err(DecisionError::Raised {
                    actor_id: actor,
                    message: String::from("boom"),
                });
            }
            Ok(())
        });
        let result = sched.run(&mut source, &mut DiscardSnapshots).unwrap();
        assert_eq!(result.rounds, 2);
        assert_eq!(result.history.total_for(ActorId::new(0)), 2);
        assert_eq!(result.history.total_for(ActorId::new(1)), 0);

        assert_eq!(result.summaries.len(), 2);
        for (summary, round) in result.summaries.iter().zip(1..) {
            assert_eq!(summary.round, round);
            assert_eq!(summary.invoked, 2);
            assert_eq!(summary.failed, vec![ActorId::new(1)]);
            assert_eq!(summary.requested, 1);
            assert_eq!(summary.applied, 1);
            assert_eq!(summary.alive_after, 2);
        }
    }

    #[test]
    fn eliminated_actors_are_not_asked() {
        let cells = vec![
            Cell::Occupant(ActorId::new(0)),
            Cell::Empty,
            Cell::Occupant(ActorId::new(2)),
            Cell::Empty,
        ];
        let field = Field::from_layout(cells, 3).unwrap();
        let mut asked = Vec::new();
        let mut sched = scheduler(field, RoundMode::Fixed { rounds: 1 });
        let mut source = scripted(3, |actor, _round, _obs, _actions| {
            asked.push(actor);
            Ok(())
        });
        sched.run(&mut source, &mut DiscardSnapshots).unwrap();
        assert_eq!(asked, vec![ActorId::new(0), ActorId::new(2)]);
    }

    #[test]
    fn stop_before_first_round() {
        let control = Arc::new(BattleControl::new());
        control.request_stop();
        let mut sched = BattleScheduler::new(
            spaced(2, 5),
            RoundMode::LastManStanding,
            4,
            SmallRng::seed_from_u64(1),
            Arc::clone(&control),
        );
        let result = sched
            .run(&mut IdleDecisionSource::new(2), &mut DiscardSnapshots)
            .unwrap();
        assert_eq!(result.end_reason, BattleEndReason::Stopped);
        assert_eq!(result.rounds, 0);
    }

    #[test]
    fn stop_mid_round_skips_remaining_actors() {
        let control = Arc::new(BattleControl::new());
        let mut sched = BattleScheduler::new(
            spaced(3, 5),
            RoundMode::LastManStanding,
            4,
            SmallRng::seed_from_u64(1),
            Arc::clone(&control),
        );
        let mut asked = Vec::new();
        let stopper = Arc::clone(&control);
        let mut source = scripted(3, |actor, _round, _obs, actions| {
            asked.push(actor);
            actions.fire(0);
            stopper.request_stop();
            Ok(())
        });
        let mut snapshots: Vec<Snapshot> = Vec::new();
        let result = sched.run(&mut source, &mut snapshots).unwrap();
        assert_eq!(asked, vec![ActorId::new(0)]);
        assert_eq!(result.end_reason, BattleEndReason::Stopped);
        assert_eq!(result.rounds, 1);
        assert!(snapshots.is_empty());
        assert_eq!(result.survivors.len(), 3);
        assert_eq!(result.summaries.len(), 1);
        assert!(result.summaries.first().unwrap().interrupted);
    }

    #[test]
    fn lms_with_single_actor_ends_immediately() {
        let mut sched = scheduler(spaced(1, 5), RoundMode::LastManStanding);
        let result = sched
            .run(&mut IdleDecisionSource::new(1), &mut DiscardSnapshots)
            .unwrap();
        assert_eq!(result.rounds, 0);
        assert_eq!(result.end_reason, BattleEndReason::Decided);
        assert_eq!(result.winner, Some(ActorId::new(0)));
    }
}
