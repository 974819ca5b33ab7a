//! Tick callback that reports the game through `tracing`.
//!
//! Kills and session milestones are logged at `info`; every other event
//! is logged at `debug` as a JSON object so a log pipeline can pick it up.
//! A progress line with the herd and session totals is emitted every
//! `progress_every` ticks.

use herding_core::runner::TickCallback;
use herding_core::tick::{GameState, TickSummary};
use herding_types::HerdEvent;
use tracing::{debug, info, warn};

/// Callback that logs each tick's notable events.
#[derive(Debug, Clone)]
pub struct LoggingCallback {
    progress_every: u64,
    kills: usize,
    events: usize,
    last_progress: Option<u64>,
}

impl LoggingCallback {
    /// Log progress every `progress_every` ticks (0 disables progress lines).
    pub const fn new(progress_every: u64) -> Self {
        Self {
            progress_every,
            kills: 0,
            events: 0,
            last_progress: None,
        }
    }

    /// Cows killed since the callback was created.
    pub const fn kills(&self) -> usize {
        self.kills
    }

    /// Events seen since the callback was created.
    pub const fn events(&self) -> usize {
        self.events
    }

    /// Tick of the most recent progress line.
    pub const fn last_progress(&self) -> Option<u64> {
        self.last_progress
    }

    fn log_event(tick: u64, event: &HerdEvent) {
        match event {
            HerdEvent::CowKilled { agent, cause } => {
                info!(tick, agent = %agent, ?cause, "Cow killed");
            }
            HerdEvent::MineExploded { trap, position } => {
                info!(tick, trap = %trap, ?position, "Mine exploded");
            }
            HerdEvent::GameStarted { duration } => {
                info!(tick, duration, "Session started");
            }
            HerdEvent::GameEnded { final_count } => {
                info!(tick, final_count, "Session ended");
            }
            other => match serde_json::to_string(other) {
                Ok(json) => debug!(tick, event = %json, "Herd event"),
                Err(e) => warn!(tick, error = %e, "failed to serialize herd event"),
            },
        }
    }
}

impl TickCallback for LoggingCallback {
    fn on_tick(&mut self, summary: &TickSummary, state: &GameState) {
        for event in &summary.events {
            Self::log_event(summary.tick, event);
        }
        self.kills = self.kills.saturating_add(summary.kills());
        self.events = self.events.saturating_add(summary.events.len());

        let due = summary
            .tick
            .checked_rem(self.progress_every)
            .is_some_and(|r| r == 0);
        if due {
            info!(
                tick = summary.tick,
                cows_alive = summary.cows_alive,
                cows_in_goal = summary.cows_in_goal,
                remaining = summary.remaining_time,
                session_active = summary.session_active,
                mode = ?state.shepherd.mode(),
                kills = self.kills,
                "Progress"
            );
            self.last_progress = Some(summary.tick);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use herding_core::config::GameConfig;
    use herding_types::{AgentId, KillCause};

    use super::*;
    use crate::spawner::build_level;

    fn summary(tick: u64, events: Vec<HerdEvent>) -> TickSummary {
        TickSummary {
            tick,
            events,
            cows_alive: 3,
            cows_in_goal: 1,
            remaining_time: 60.0,
            session_active: true,
        }
    }

    #[test]
    fn counts_kills_and_events() {
        let state = build_level(&GameConfig::default()).unwrap();
        let mut cb = LoggingCallback::new(0);

        cb.on_tick(
            &summary(
                1,
                vec![
                    HerdEvent::CowKilled {
                        agent: AgentId::new(),
                        cause: KillCause::Explosion,
                    },
                    HerdEvent::CowCountChanged { count: 1 },
                ],
            ),
            &state,
        );
        cb.on_tick(&summary(2, vec![HerdEvent::TimeUpdated { remaining: 59.0 }]), &state);

        assert_eq!(cb.kills(), 1);
        assert_eq!(cb.events(), 3);
        assert_eq!(cb.last_progress(), None);
    }

    #[test]
    fn progress_follows_the_interval() {
        let state = build_level(&GameConfig::default()).unwrap();
        let mut cb = LoggingCallback::new(60);

        for tick in 1..=150 {
            cb.on_tick(&summary(tick, Vec::new()), &state);
        }

        assert_eq!(cb.last_progress(), Some(120));
    }
}
