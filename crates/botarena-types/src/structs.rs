//! Battle statistics and the snapshot value published after each action.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::ActionKind;
use crate::ids::ActorId;

/// Per-actor, per-kind counts of processed actions over a whole battle.
///
/// Statistics only: nothing in the engine reads these counts to make a
/// decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionHistory(BTreeMap<ActorId, BTreeMap<ActionKind, u64>>);

impl ActionHistory {
    /// An empty history.
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Count one processed action of `kind` for `actor`.
    pub fn record(&mut self, actor: ActorId, kind: ActionKind) {
        let count = self.0.entry(actor).or_default().entry(kind).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// How many actions of `kind` were processed for `actor`.
    pub fn count(&self, actor: ActorId, kind: ActionKind) -> u64 {
        self.0
            .get(&actor)
            .and_then(|kinds| kinds.get(&kind))
            .copied()
            .unwrap_or(0)
    }

    /// Total processed actions for `actor` across all kinds.
    pub fn total_for(&self, actor: ActorId) -> u64 {
        self.0
            .get(&actor)
            .map_or(0, |kinds| kinds.values().fold(0_u64, |acc, n| acc.saturating_add(*n)))
    }

    /// Counts per kind summed over all actors. Every kind is present, even
    /// when its count is zero.
    pub fn summed(&self) -> BTreeMap<ActionKind, u64> {
        let mut sums: BTreeMap<ActionKind, u64> =
            ActionKind::ALL.iter().map(|kind| (*kind, 0)).collect();
        for kinds in self.0.values() {
            for (kind, count) in kinds {
                let entry = sums.entry(*kind).or_insert(0);
                *entry = entry.saturating_add(*count);
            }
        }
        sums
    }

    /// Iterate over actors and their per-kind counts.
    pub fn iter(&self) -> impl Iterator<Item = (&ActorId, &BTreeMap<ActionKind, u64>)> {
        self.0.iter()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Immutable point-in-time copy of a battle, handed to listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Milliseconds since the battle started.
    pub elapsed_ms: u64,
    /// The round during which this snapshot was taken.
    pub round: u64,
    /// The winner, if exactly one actor remains.
    pub winner: Option<ActorId>,
    /// Textual field representation, one character per cell.
    pub field: String,
    /// Copy of the action history at the time of the snapshot.
    pub history: ActionHistory,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn history_counts_and_sums() {
        let mut history = ActionHistory::new();
        let a = ActorId::new(0);
        let b = ActorId::new(1);
        history.record(a, ActionKind::Fire);
        history.record(a, ActionKind::Fire);
        history.record(b, ActionKind::Move);

        assert_eq!(history.count(a, ActionKind::Fire), 2);
        assert_eq!(history.count(a, ActionKind::Move), 0);
        assert_eq!(history.total_for(a), 2);

        let summed = history.summed();
        assert_eq!(summed.get(&ActionKind::Fire), Some(&2));
        assert_eq!(summed.get(&ActionKind::Move), Some(&1));
        assert_eq!(summed.get(&ActionKind::PlaceHazard), Some(&0));
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let mut history = ActionHistory::new();
        history.record(ActorId::new(0), ActionKind::Fire);
        let snapshot = Snapshot {
            elapsed_ms: 12,
            round: 1,
            winner: Some(ActorId::new(0)),
            field: String::from("0---------"),
            history,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["winner"], 0);
        assert_eq!(json["field"], "0---------");
        assert_eq!(json["history"]["0"]["Fire"], 1);
    }
}
