//! Error types for the battle binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and the battle itself.

/// Top-level error for the battle binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: botarena_core::config::ConfigError,
    },

    /// The `bots` section of the configuration is malformed.
    #[error("bots config error: {source}")]
    BotsConfig {
        /// The underlying YAML error.
        source: serde_yml::Error,
    },

    /// A bot program could not be loaded.
    #[error("bot loading error: {source}")]
    Load {
        /// The underlying loader error.
        #[from]
        source: crate::loader::LoadError,
    },

    /// The battle session failed.
    #[error("session error: {source}")]
    Session {
        /// The underlying session error.
        #[from]
        source: botarena_core::session::SessionError,
    },

    /// The blocking battle task panicked or was cancelled.
    #[error("battle task failed: {source}")]
    Join {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },
}
