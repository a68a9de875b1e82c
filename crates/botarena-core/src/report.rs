//! Final battle statistics as printed at the end of a run.

use core::fmt;

use crate::scheduler::BattleResult;

const RULE: &str = "***************************";

/// Human-readable rendering of a [`BattleResult`].
#[derive(Debug, Clone, Copy)]
pub struct BattleReport<'a>(pub &'a BattleResult);

impl fmt::Display for BattleReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Time passed: {} ms.", result.elapsed_ms)?;
        writeln!(f, "Number of bots: {}", result.number_of_actors)?;
        match result.winner {
            Some(winner) => writeln!(f, "Winner: Bot {winner}")?,
            None => writeln!(f, "Winner: Nobody")?,
        }
        writeln!(f, "Rounds: {} ({})", result.rounds, result.end_reason)?;
        let failed: usize = result.summaries.iter().map(|s| s.failed.len()).sum();
        writeln!(f, "Failed decisions: {failed}")?;

        writeln!(f, "History:")?;
        if result.history.is_empty() {
            writeln!(f, "  (no actions)")?;
        }
        for (actor, kinds) in result.history.iter() {
            write!(f, "  Bot {actor}:")?;
            for (kind, count) in kinds {
                write!(f, " {kind}={count}")?;
            }
            writeln!(f)?;
        }

        write!(f, "Summed up history:")?;
        for (kind, count) in result.history.summed() {
            write!(f, " {kind}={count}")?;
        }
        writeln!(f)?;

        writeln!(f, "Final Battlefield: {}", result.final_field)?;
        write!(f, "{RULE}")
    }
}
