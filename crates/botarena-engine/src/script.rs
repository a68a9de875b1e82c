//! Scripted bots.
//!
//! A bot is a short YAML program: a name and a list of steps run in order
//! every round. [`ScriptedDecisionSource`] implements the core's
//! [`DecisionSource`] by running the program of each actor against the
//! actor's observation.
//!
//! ```yaml
//! name: hunter
//! steps:
//!   - fire: { offset: 1 }     # the cell right ahead
//!   - move
//!   - fire: random            # any cell of the field
//!   - place_hazard: { offset: 0 }
//!   - fire: nearest_enemy     # skipped when nobody else is left
//!   - log: done for this round
//! fail_after_round: 10        # optional: raise an error from round 11 on
//! ```
//!
//! Positions are resolved against the observation taken before the round,
//! so `{ offset: 0 }` is the cell the bot stood on when it decided, even
//! after a `move` earlier in the same program. Offsets do not wrap around
//! the field; a target past either end is dropped by the field.

use botarena_core::decision::{ActionCollector, DecisionError, DecisionSource};
use botarena_types::{ActorId, Observation};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::debug;

/// Errors that can occur while parsing a bot program.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// The program is not valid YAML or does not match the format.
    #[error("failed to parse bot program {origin}: {source}")]
    Parse {
        /// Where the program came from.
        origin: String,
        /// The underlying YAML error.
        source: serde_yml::Error,
    },

    /// The program parsed but cannot be used.
    #[error("invalid bot program {origin}: {reason}")]
    Invalid {
        /// Where the program came from.
        origin: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Where a step aims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Relative to the bot's own position.
    Offset(i64),
    /// A fixed cell index.
    Absolute(i64),
    /// A uniformly random cell of the field.
    Random,
    /// The first other bot ahead, wrapping around the field.
    NearestEnemy,
}

/// One instruction of a bot program.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Move to the next free cell.
    Move,
    /// Fire at a target.
    Fire(Target),
    /// Place a hazard at a target.
    PlaceHazard(Target),
    /// Write a log line.
    Log(String),
}

/// A parsed bot program.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotProgram {
    /// Display name.
    pub name: String,

    /// Steps run every round, in order.
    #[serde(
        default,
        deserialize_with = "serde_yml::with::singleton_map_recursive::deserialize"
    )]
    pub steps: Vec<Step>,

    /// The bot raises an error in every round after this one.
    #[serde(default)]
    pub fail_after_round: Option<u64>,
}

impl BotProgram {
    /// Parse a program from YAML. `origin` names the source in errors.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Parse`] for malformed YAML and
    /// [`ScriptError::Invalid`] for an empty name.
    pub fn parse(yaml: &str, origin: &str) -> Result<Self, ScriptError> {
        let program: Self = serde_yml::from_str(yaml).map_err(|source| ScriptError::Parse {
            origin: origin.to_owned(),
            source,
        })?;
        if program.name.trim().is_empty() {
            return Err(ScriptError::Invalid {
                origin: origin.to_owned(),
                reason: String::from("name must not be empty"),
            });
        }
        Ok(program)
    }
}

/// Mixed into the battle seed so bot randomness does not replay the stream
/// used for placement and merge order.
const SCRIPT_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Runs one [`BotProgram`] per actor. Actor `i` runs program `i`.
#[derive(Debug)]
pub struct ScriptedDecisionSource {
    programs: Vec<BotProgram>,
    rng: SmallRng,
}

impl ScriptedDecisionSource {
    /// Create a source for `programs`. `battle_seed` makes `random` targets
    /// reproducible; the stream is derived from it, not equal to it.
    pub fn new(programs: Vec<BotProgram>, battle_seed: Option<u64>) -> Self {
        let rng = match battle_seed {
            Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(SCRIPT_SEED_SALT)),
            None => SmallRng::from_os_rng(),
        };
        Self { programs, rng }
    }

    /// Name of the bot playing `actor`.
    pub fn name_of(&self, actor: ActorId) -> Option<&str> {
        self.programs.get(actor.index()).map(|p| p.name.as_str())
    }
}

impl DecisionSource for ScriptedDecisionSource {
    fn actor_count(&self) -> u32 {
        u32::try_from(self.programs.len()).unwrap_or(u32::MAX)
    }

    fn decide(
        &mut self,
        actor: ActorId,
        round: u64,
        observation: &Observation,
        actions: &mut ActionCollector,
    ) -> Result<(), DecisionError> {
        let program = self
            .programs
            .get(actor.index())
            .ok_or(DecisionError::UnknownActor { actor_id: actor })?;

        if let Some(limit) = program.fail_after_round
            && round > limit
        {
            return Err(DecisionError::Raised {
                actor_id: actor,
                message: format!("{} gave up after round {limit}", program.name),
            });
        }

        for step in &program.steps {
            match step {
                Step::Move => actions.move_forward(),
                Step::Fire(target) => {
                    if let Some(at) = resolve(*target, actor, observation, &mut self.rng)? {
                        actions.fire(at);
                    }
                }
                Step::PlaceHazard(target) => {
                    if let Some(at) = resolve(*target, actor, observation, &mut self.rng)? {
                        actions.place_hazard(at);
                    }
                }
                Step::Log(text) => actions.log(text),
            }
        }
        Ok(())
    }
}

/// Turn a target into a cell index. `None` means the step is skipped.
fn resolve(
    target: Target,
    actor: ActorId,
    observation: &Observation,
    rng: &mut SmallRng,
) -> Result<Option<i64>, DecisionError> {
    let as_index = |pos: usize| {
        i64::try_from(pos).map_err(|_overflow| DecisionError::Internal {
            message: format!("position {pos} does not fit in i64"),
        })
    };

    match target {
        Target::Absolute(at) => Ok(Some(at)),
        Target::Offset(offset) => {
            let here = observation.my_position().ok_or_else(|| DecisionError::Raised {
                actor_id: actor,
                message: String::from("own position unknown"),
            })?;
            let at = as_index(here)?
                .checked_add(offset)
                .ok_or_else(|| DecisionError::Raised {
                    actor_id: actor,
                    message: format!("offset {offset} overflows"),
                })?;
            Ok(Some(at))
        }
        Target::Random => {
            let size = observation.size();
            if size == 0 {
                return Ok(None);
            }
            as_index(rng.random_range(0..size)).map(Some)
        }
        Target::NearestEnemy => match observation.nearest_enemy_ahead() {
            Some(pos) => as_index(pos).map(Some),
            None => {
                debug!(actor = %actor, "No enemy in sight, step skipped");
                Ok(None)
            }
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use botarena_types::{ActionKind, Cell, Command};

    use super::*;

    fn observation(actor: u32, cells: &str) -> Observation {
        let cells: Vec<Cell> = cells
            .chars()
            .map(|c| match c {
                '-' => Cell::Empty,
                '#' => Cell::Hazard,
                d => Cell::Occupant(ActorId::new(d.to_digit(36).unwrap())),
            })
            .collect();
        let id = ActorId::new(actor);
        let my_position = cells.iter().position(|c| c.occupant() == Some(id));
        Observation {
            actor_id: id,
            round: 1,
            number_of_actors: 3,
            my_position,
            cells,
        }
    }

    fn run(program: &str, actor: u32, cells: &str) -> Result<Vec<Command>, DecisionError> {
        let program = BotProgram::parse(program, "test").unwrap();
        let programs = vec![program.clone(), program.clone(), program];
        let mut source = ScriptedDecisionSource::new(programs, Some(1));
        let id = ActorId::new(actor);
        let mut collector = ActionCollector::new(id);
        source.decide(id, 1, &observation(actor, cells), &mut collector)?;
        Ok(collector
            .into_result()
            .actions
            .into_iter()
            .map(|a| a.command)
            .collect())
    }

    #[test]
    fn parses_every_step_kind() {
        let yaml = r"
name: sampler
steps:
  - move
  - fire: { offset: 1 }
  - fire: { absolute: 3 }
  - place_hazard: random
  - fire: nearest_enemy
  - log: hello
fail_after_round: 4
";
        let program = BotProgram::parse(yaml, "inline").unwrap();
        assert_eq!(program.name, "sampler");
        assert_eq!(program.fail_after_round, Some(4));
        assert_eq!(
            program.steps,
            vec![
                Step::Move,
                Step::Fire(Target::Offset(1)),
                Step::Fire(Target::Absolute(3)),
                Step::PlaceHazard(Target::Random),
                Step::Fire(Target::NearestEnemy),
                Step::Log(String::from("hello")),
            ]
        );
    }

    #[test]
    fn rejects_bad_programs() {
        assert!(matches!(
            BotProgram::parse("name: ''\n", "x"),
            Err(ScriptError::Invalid { .. })
        ));
        assert!(matches!(
            BotProgram::parse("steps: [jump]\nname: a\n", "x"),
            Err(ScriptError::Parse { .. })
        ));
    }

    #[test]
    fn offsets_are_relative_to_observed_position() {
        let commands = run(
            "name: a\nsteps:\n  - move\n  - place_hazard: { offset: 0 }\n  - fire: { offset: -3 }\n",
            1,
            "0--1--2",
        )
        .unwrap();
        assert_eq!(
            commands,
            vec![
                Command::Move,
                Command::PlaceHazard { target: 3 },
                Command::Fire { target: 0 },
            ]
        );
    }

    #[test]
    fn nearest_enemy_wraps_and_skips_self() {
        let commands = run("name: a\nsteps:\n  - fire: nearest_enemy\n", 2, "-0--2-").unwrap();
        assert_eq!(commands, vec![Command::Fire { target: 1 }]);

        let alone = run("name: a\nsteps:\n  - fire: nearest_enemy\n", 0, "--0--").unwrap();
        assert!(alone.is_empty());
    }

    #[test]
    fn random_targets_stay_on_the_field() {
        let program = BotProgram::parse(
            "name: a\nsteps:\n  - fire: random\n  - fire: random\n  - fire: random\n",
            "t",
        )
        .unwrap();
        let mut source = ScriptedDecisionSource::new(vec![program], Some(7));
        let id = ActorId::new(0);
        let obs = observation(0, "0----");
        for _ in 0..20 {
            let mut collector = ActionCollector::new(id);
            source.decide(id, 1, &obs, &mut collector).unwrap();
            for action in collector.into_result().actions {
                assert_eq!(action.kind(), ActionKind::Fire);
                let target = action.command.target().unwrap();
                assert!((0..5).contains(&target));
            }
        }
    }

    #[test]
    fn random_targets_do_not_replay_the_battle_stream() {
        let program = BotProgram::parse("name: a\nsteps:\n  - fire: random\n", "t").unwrap();
        let mut source = ScriptedDecisionSource::new(vec![program], Some(11));
        let id = ActorId::new(0);
        let mut cells = String::from("0");
        cells.push_str(&"-".repeat(999));
        let obs = observation(0, &cells);

        let mut battle_rng = SmallRng::seed_from_u64(11);
        let mut drawn = Vec::new();
        let mut replayed = Vec::new();
        for _ in 0..20 {
            let mut collector = ActionCollector::new(id);
            source.decide(id, 1, &obs, &mut collector).unwrap();
            drawn.push(collector.into_result().actions.first().unwrap().command.target());
            replayed.push(i64::try_from(battle_rng.random_range(0..1000_usize)).ok());
        }
        assert_ne!(drawn, replayed);
    }

    #[test]
    fn bundled_hunter_steps() {
        let program = BotProgram::parse(include_str!("../bots/hunter.yaml"), "hunter").unwrap();
        assert_eq!(program.steps.first(), Some(&Step::Fire(Target::Offset(1))));
        assert!(program.steps.contains(&Step::Fire(Target::Random)));
        assert!(program.steps.contains(&Step::PlaceHazard(Target::Offset(0))));
    }

    #[test]
    fn fail_after_round_raises() {
        let program = BotProgram::parse("name: quitter\nsteps: [move]\nfail_after_round: 2\n", "q")
            .unwrap();
        let mut source = ScriptedDecisionSource::new(vec![program], Some(1));
        let id = ActorId::new(0);
        let obs = observation(0, "0--");
        let mut collector = ActionCollector::new(id);
        assert!(source.decide(id, 2, &obs, &mut collector).is_ok());
        let mut collector = ActionCollector::new(id);
        let err = source.decide(id, 3, &obs, &mut collector).unwrap_err();
        assert!(err.to_string().contains("quitter gave up after round 2"));
    }

    #[test]
    fn offset_without_position_is_an_error() {
        let result = run("name: a\nsteps:\n  - fire: { offset: 1 }\n", 1, "0---2");
        assert!(matches!(result, Err(DecisionError::Raised { .. })));
    }

    #[test]
    fn unknown_actor_is_an_error() {
        let mut source = ScriptedDecisionSource::new(Vec::new(), Some(1));
        let id = ActorId::new(0);
        let mut collector = ActionCollector::new(id);
        let result = source.decide(id, 1, &observation(0, "0"), &mut collector);
        assert!(matches!(result, Err(DecisionError::UnknownActor { .. })));
        assert_eq!(source.actor_count(), 0);
        assert_eq!(source.name_of(id), None);
    }
}
