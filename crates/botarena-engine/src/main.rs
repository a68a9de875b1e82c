//! Battle binary for Bot Arena.
//!
//! Loads the configuration and the bot programs, runs one battle while
//! drawing the field live on the terminal, and prints the final report.
//!
//! # Usage
//!
//! ```text
//! botarena [BOT_FILE_OR_DIR]...
//! ```
//!
//! Without arguments the bots listed under `bots` in the configuration
//! file are used, or a hunter against a hunted when there is no such list.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `botarena-config.yaml` (or `BOTARENA_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Resolve and load the bot programs
//! 4. Create the battle session and its snapshot consumer
//! 5. Run the battle on a blocking thread, stopping on Ctrl-C
//! 6. Drain the snapshots and print the report

mod error;
mod listener;
mod loader;
mod script;

use std::path::{Path, PathBuf};

use botarena_core::config::ArenaConfig;
use botarena_core::report::BattleReport;
use botarena_core::session::BattleSession;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::listener::ConsoleListener;
use crate::loader::BotSource;
use crate::script::ScriptedDecisionSource;

/// Environment variable naming the configuration file.
const CONFIG_ENV_VAR: &str = "BOTARENA_CONFIG";

/// Configuration file used when `BOTARENA_CONFIG` is not set.
const DEFAULT_CONFIG_PATH: &str = "botarena-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the battle itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = config_path();
    let config = load_config(&config_path)?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(
        config = %config_path.display(),
        rounds = ?config.battle.rounds,
        space_per_actor = config.battle.space_per_actor,
        max_actions_per_round = config.battle.max_actions_per_round,
        seed = ?config.battle.seed,
        "botarena starting"
    );

    // 3. Resolve and load bots.
    let args: Vec<String> = std::env::args().skip(1).collect();
    let sources = if args.is_empty() {
        load_bot_sources(&config_path)?.unwrap_or_else(loader::default_sources)
    } else {
        loader::sources_from_args(&args)?
    };
    let programs = loader::load_programs(&sources)?;
    let mut decisions = ScriptedDecisionSource::new(programs, config.battle.seed);

    // 4. Create the session.
    let mut session = BattleSession::create(config.battle.clone(), ConsoleListener::stdout());
    let control = session.control();

    // 5. Run the battle, stopping on Ctrl-C.
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping battle");
            control.request_stop();
        }
    });

    let (session, decisions, outcome) = tokio::task::spawn_blocking(move || {
        let outcome = session.run(&mut decisions);
        (session, decisions, outcome)
    })
    .await
    .map_err(EngineError::from)?;
    ctrl_c.abort();

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            session.shutdown().await;
            return Err(EngineError::from(e).into());
        }
    };

    // 6. Drain snapshots and report.
    let delivered = session.finish().await;
    println!();
    println!("{}", BattleReport(&result));

    let winner = result.winner.and_then(|id| decisions.name_of(id));
    info!(
        end_reason = %result.end_reason,
        rounds = result.rounds,
        winner = winner.unwrap_or("nobody"),
        snapshots = delivered,
        "botarena shutdown complete"
    );

    Ok(())
}

fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV_VAR)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load the battle configuration.
///
/// A missing file means defaults, with environment overrides still
/// applied.
fn load_config(path: &Path) -> Result<ArenaConfig, EngineError> {
    if path.exists() {
        Ok(ArenaConfig::from_file(path)?)
    } else {
        let mut config = ArenaConfig::default();
        config.apply_env_overrides()?;
        config.battle.validate()?;
        Ok(config)
    }
}

/// Read the `bots` section of the configuration file, if there is one.
fn load_bot_sources(path: &Path) -> Result<Option<Vec<BotSource>>, EngineError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path).map_err(|e| {
        EngineError::from(botarena_core::config::ConfigError::from(e))
    })?;

    // Parse the full YAML and extract just the "bots" section.
    let raw: serde_yml::Value =
        serde_yml::from_str(&contents).map_err(|source| EngineError::BotsConfig { source })?;

    match raw.get("bots") {
        Some(bots) => {
            let sources = loader::sources_from_config(bots.clone())
                .map_err(|source| EngineError::BotsConfig { source })?;
            Ok((!sources.is_empty()).then_some(sources))
        }
        None => Ok(None),
    }
}
