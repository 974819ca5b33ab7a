//! Game loop runner.
//!
//! This module provides [`run_simulation`], the top-level async function
//! that drives the tick loop until one of these ends the run:
//!
//! - **Session over**: the countdown reached zero and the final count was
//!   announced
//! - **Herd lost**: the last cow died (when enabled)
//! - **Tick limit**: `max_ticks` ticks have run
//!
//! The runner wraps the single-tick [`run_tick`] function and adds pacing
//! around it. In real-time mode ticks are spaced by a
//! [`tokio::time::interval`] at the configured rate; otherwise they run
//! back to back, yielding to the runtime between ticks.
//!
//! [`run_tick`]: crate::tick::run_tick

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::config::SimulationConfig;
use crate::input::InputSource;
use crate::tick::{self, GameState, TickError, TickSummary};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Why the run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The session countdown ran out.
    SessionEnded,
    /// Every cow died.
    HerdLost,
    /// The configured tick limit was reached.
    MaxTicksReached,
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: EndReason,
    /// The last tick summary.
    pub final_summary: TickSummary,
    /// Total number of ticks executed.
    pub total_ticks: u64,
}

/// Callback invoked after each tick completes.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, state: &GameState);
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _state: &GameState) {}
}

/// Run the game loop until a termination condition is met.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick execution fails.
pub async fn run_simulation(
    state: &mut GameState,
    input: &mut dyn InputSource,
    bounds: &SimulationConfig,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut total_ticks: u64 = 0;

    info!(
        max_ticks = bounds.max_ticks,
        tick_rate_hz = bounds.tick_rate_hz,
        real_time = bounds.real_time,
        cows = state.herd.len(),
        traps = state.traps.len(),
        "Simulation starting"
    );

    let mut pacer = bounds.real_time.then(|| {
        let mut interval = tokio::time::interval(Duration::from_secs_f32(state.dt.max(0.001)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });

    loop {
        // --- Pace ---
        match pacer.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => tokio::task::yield_now().await,
        }

        // --- Execute tick ---
        let summary = tick::run_tick(state, input)?;
        total_ticks = total_ticks.saturating_add(1);

        // --- Notify callback ---
        callback.on_tick(&summary, state);

        // --- Check session end ---
        if summary.session_ended() {
            info!(
                tick = summary.tick,
                final_count = summary.cows_in_goal,
                "Session over"
            );
            return Ok(SimulationResult {
                end_reason: EndReason::SessionEnded,
                final_summary: summary,
                total_ticks,
            });
        }

        // --- Check herd lost ---
        if bounds.stop_when_herd_lost && summary.cows_alive == 0 {
            info!(tick = summary.tick, "No cows left");
            return Ok(SimulationResult {
                end_reason: EndReason::HerdLost,
                final_summary: summary,
                total_ticks,
            });
        }

        // --- Check tick limit ---
        if bounds.max_ticks > 0 && total_ticks >= bounds.max_ticks {
            info!(
                tick = summary.tick,
                max_ticks = bounds.max_ticks,
                "Tick limit reached"
            );
            return Ok(SimulationResult {
                end_reason: EndReason::MaxTicksReached,
                final_summary: summary,
                total_ticks,
            });
        }
    }
}

/// Log the end of a run.
pub fn log_simulation_end(result: &SimulationResult) {
    let summary = &result.final_summary;
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = summary.tick,
        cows_alive = summary.cows_alive,
        cows_in_goal = summary.cows_in_goal,
        "Simulation ended"
    );

    if result.end_reason != EndReason::SessionEnded && summary.session_active {
        warn!(
            remaining = summary.remaining_time,
            "Run stopped with the session still running"
        );
    }
}
