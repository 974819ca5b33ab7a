//! Error types for the game binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during level setup and the run.

/// Top-level error for the game binary.
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
        source: herding_core::config::ConfigError,
    },

    /// Placing a body in the world failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: herding_world::WorldError,
    },

    /// Spawning a cow into the game failed.
    #[error("spawn error: {source}")]
    Spawn {
        /// The underlying tick error.
        #[from]
        source: herding_core::tick::TickError,
    },

    /// The run loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: herding_core::runner::RunnerError,
    },

    /// The level layout is unusable.
    #[error("level error: {message}")]
    Level {
        /// Description of the problem.
        message: String,
    },
}
