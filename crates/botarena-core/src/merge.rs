//! Fair merging of per-actor action sequences and per-round quotas.
//!
//! Every actor submits its whole round at once. [`interleave`] turns those
//! sequences into a single application order: each step draws one of the
//! actors that still has actions left, uniformly at random, and takes the
//! head of its queue. An actor's own actions therefore keep their relative
//! order while no actor gets to go entirely first.
//!
//! [`apply_with_quota`] then walks the merged order and applies each action
//! to the [`Field`] as long as its actor has quota left for the round.

use std::collections::{BTreeMap, VecDeque};

use botarena_types::{Action, ActorId, DecisionResult};
use rand::Rng;
use tracing::trace;

use crate::field::{ActionOutcome, Field};

/// Interleave the actions of several actors into one sequence.
///
/// Per-actor order is preserved. Results with no actions contribute
/// nothing. The draw order depends only on `rng`, so a seeded generator
/// reproduces the same merge.
pub fn interleave<R: Rng + ?Sized>(results: Vec<DecisionResult>, rng: &mut R) -> Vec<Action> {
    let mut queues: Vec<VecDeque<Action>> = results
        .into_iter()
        .filter(|result| !result.is_empty())
        .map(|result| VecDeque::from(result.actions))
        .collect();
    let total: usize = queues.iter().map(VecDeque::len).sum();
    let mut merged = Vec::with_capacity(total);

    while !queues.is_empty() {
        let pick = rng.random_range(0..queues.len());
        let Some(queue) = queues.get_mut(pick) else {
            break;
        };
        if let Some(action) = queue.pop_front() {
            merged.push(action);
        }
        if queue.is_empty() {
            queues.swap_remove(pick);
        }
    }

    merged
}

/// Per-round action counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaTracker {
    /// Maximum actions applied per actor.
    max: u32,
    /// Actions applied so far, per actor.
    applied: BTreeMap<ActorId, u32>,
}

impl QuotaTracker {
    /// Fresh counters allowing `max` actions per actor.
    pub const fn new(max: u32) -> Self {
        Self {
            max,
            applied: BTreeMap::new(),
        }
    }

    /// Take one unit of `actor`'s quota. Returns `false` once the quota is
    /// used up, leaving the counter unchanged.
    pub fn try_consume(&mut self, actor: ActorId) -> bool {
        let count = self.applied.entry(actor).or_insert(0);
        if *count < self.max {
            *count = count.saturating_add(1);
            true
        } else {
            false
        }
    }

    /// How many actions `actor` has used this round.
    pub fn applied(&self, actor: ActorId) -> u32 {
        self.applied.get(&actor).copied().unwrap_or(0)
    }
}

/// Totals from applying one merged sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Actions handed to the field.
    pub applied: u32,
    /// Actions dropped because their actor's quota was exhausted.
    pub skipped_by_quota: u32,
    /// Actors eliminated, in the order it happened.
    pub eliminated: Vec<ActorId>,
}

/// Apply `merged` to `field`, allowing at most `max_per_actor` actions per
/// actor. `after_each` runs after every applied action with the updated
/// field.
pub fn apply_with_quota<F>(
    field: &mut Field,
    merged: &[Action],
    max_per_actor: u32,
    mut after_each: F,
) -> ApplyReport
where
    F: FnMut(&Field, &Action, ActionOutcome),
{
    let mut quota = QuotaTracker::new(max_per_actor);
    let mut report = ApplyReport::default();

    for action in merged {
        if !quota.try_consume(action.actor_id) {
            trace!(actor = %action.actor_id, kind = %action.kind(), "Quota exhausted, action skipped");
            report.skipped_by_quota = report.skipped_by_quota.saturating_add(1);
            continue;
        }
        let outcome = field.apply_action(action);
        report.applied = report.applied.saturating_add(1);
        if let Some(victim) = outcome.eliminated() {
            report.eliminated.push(victim);
        }
        after_each(field, action, outcome);
    }

    report
}
