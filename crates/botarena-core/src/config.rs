//! Configuration loading and typed config structures for a battle.
//!
//! The configuration lives in `botarena-config.yaml`. This module defines
//! the strongly-typed structs that mirror the `battle` and `logging`
//! sections of that file. The `bots` section belongs to the engine binary,
//! which knows how to load decision logic; the core never reads it.

use std::path::Path;

use serde::Deserialize;

use crate::field::Placement;

/// Environment variable that overrides `battle.rounds`.
///
/// Accepts a positive round count, or `lms` for last man standing.
pub const ROUNDS_ENV_VAR: &str = "BOTARENA_ROUNDS";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is syntactically fine but not usable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration as seen by the core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ArenaConfig {
    /// Battle parameters.
    #[serde(default)]
    pub battle: BattleConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ArenaConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `BOTARENA_ROUNDS` overrides `battle.rounds` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides()?;
        config.battle.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides are
    /// applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.battle.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `BOTARENA_ROUNDS` cannot be
    /// parsed.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var(ROUNDS_ENV_VAR) {
            self.battle.apply_rounds_override(&val)?;
        }
        Ok(())
    }
}

/// How many rounds a battle runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundMode {
    /// Run at most this many rounds, stopping early once the battle is
    /// decided.
    Fixed {
        /// Upper bound on rounds.
        rounds: u64,
    },
    /// Run until at most one actor is left, with no upper bound.
    LastManStanding,
}

/// Battle parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BattleConfig {
    /// Number of rounds, 5 when omitted. `null` means last man standing.
    #[serde(default = "default_rounds")]
    pub rounds: Option<u64>,

    /// Cells per actor; field size is actors times this.
    #[serde(default = "default_space_per_actor")]
    pub space_per_actor: u32,

    /// Maximum actions applied per actor per round.
    #[serde(default = "default_max_actions_per_round")]
    pub max_actions_per_round: u32,

    /// Initial placement policy.
    #[serde(default)]
    pub placement: Placement,

    /// Seed for placement and merge randomness. Random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            space_per_actor: default_space_per_actor(),
            max_actions_per_round: default_max_actions_per_round(),
            placement: Placement::default(),
            seed: None,
        }
    }
}

impl BattleConfig {
    /// The round mode described by `rounds`.
    pub const fn round_mode(&self) -> RoundMode {
        match self.rounds {
            Some(rounds) => RoundMode::Fixed { rounds },
            None => RoundMode::LastManStanding,
        }
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rounds == Some(0) {
            return Err(ConfigError::Invalid {
                reason: "rounds must be at least 1 (use null for last man standing)".to_owned(),
            });
        }
        if self.space_per_actor == 0 {
            return Err(ConfigError::Invalid {
                reason: "space_per_actor must be at least 1".to_owned(),
            });
        }
        if self.max_actions_per_round == 0 {
            return Err(ConfigError::Invalid {
                reason: "max_actions_per_round must be at least 1".to_owned(),
            });
        }
        Ok(())
    }

    /// Override `rounds` from a raw string: a positive count, or `lms`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the string is neither.
    pub fn apply_rounds_override(&mut self, raw: &str) -> Result<(), ConfigError> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("lms") || trimmed.eq_ignore_ascii_case("last_man_standing")
        {
            self.rounds = None;
            return Ok(());
        }
        let rounds: u64 = trimmed.parse().map_err(|e| ConfigError::Invalid {
            reason: format!("invalid {ROUNDS_ENV_VAR} value {trimmed:?}: {e}"),
        })?;
        self.rounds = Some(rounds);
        self.validate()
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default log level filter when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_rounds() -> Option<u64> {
    Some(5)
}

const fn default_space_per_actor() -> u32 {
    20
}

const fn default_max_actions_per_round() -> u32 {
    4
}

fn default_log_level() -> String {
    "info".to_owned()
}
