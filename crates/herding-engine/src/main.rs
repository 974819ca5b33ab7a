//! Game binary for the herding simulation.
//!
//! This is the main entry point that wires together configuration, the
//! level spawner, the scripted shepherd, and the run loop. It loads
//! configuration, builds the level, and runs the game until the session
//! ends, the herd is lost, or the tick limit is reached.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `herding-config.yaml` (or `HERDING_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the level: terrain, shepherd, herd, traps, goal
//! 4. Create the scripted shepherd input
//! 5. Run the game loop
//! 6. Log the result

mod error;
mod log_callback;
mod script;
mod spawner;

use std::path::PathBuf;

use herding_core::config::GameConfig;
use herding_core::runner;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::log_callback::LoggingCallback;
use crate::script::ScriptedShepherd;

/// Environment variable naming an alternative config file.
const CONFIG_ENV: &str = "HERDING_CONFIG";

/// Config file looked up in the working directory.
const DEFAULT_CONFIG_PATH: &str = "herding-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, level setup, or the run fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so report where it
    //    came from once the subscriber exists.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("herding-engine starting");
    info!(
        source = %source,
        seed = config.world.seed,
        cows = config.world.cow_count,
        tick_rate_hz = config.simulation.tick_rate_hz,
        session_seconds = config.session.duration,
        "Configuration loaded"
    );

    // 3. Build the level.
    let mut state = spawner::build_level(&config)?;

    // 4. Scripted shepherd.
    let mut input = ScriptedShepherd::demo(&config);
    info!(last_cue = input.last_tick(), "Shepherd script loaded");

    // 5. Run.
    let progress_every = ticks_per_second(&config);
    let mut callback = LoggingCallback::new(progress_every);
    let result =
        runner::run_simulation(&mut state, &mut input, &config.simulation, &mut callback)
            .await
            .map_err(EngineError::from)?;

    // 6. Log results.
    runner::log_simulation_end(&result);

    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        kills = callback.kills(),
        events = callback.events(),
        "herding-engine shutdown complete"
    );

    Ok(())
}

/// Load the game configuration.
///
/// Uses the file named by `HERDING_CONFIG` when set, otherwise
/// `herding-config.yaml` in the working directory. A missing default file
/// falls back to built-in defaults; a missing explicit file is an error.
fn load_config() -> Result<(GameConfig, String), EngineError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        let path = PathBuf::from(path);
        let config = GameConfig::from_file(&path)?;
        return Ok((config, path.display().to_string()));
    }

    let path = PathBuf::from(DEFAULT_CONFIG_PATH);
    if path.exists() {
        let config = GameConfig::from_file(&path)?;
        Ok((config, path.display().to_string()))
    } else {
        Ok((GameConfig::default(), "defaults".to_owned()))
    }
}

/// Ticks in one simulated second, at least one.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn ticks_per_second(config: &GameConfig) -> u64 {
    (1.0 / config.simulation.tick_seconds()).round().max(1.0) as u64
}
