//! Timed scoring session.
//!
//! A [`SessionCounter`] counts the cows standing in the goal volume while a
//! countdown runs. The countdown is a repeating one-second timer: every fire
//! takes exactly one second off the clock, and the session ends the moment
//! the clock reaches zero. The final count is announced exactly once per
//! session.

use std::collections::BTreeSet;

use glam::Vec3;
use herding_types::{AgentId, HerdEvent};
use herding_world::{EventBus, TimerHandle, TimerService};
use serde::Deserialize;
use tracing::{debug, info};

/// Seconds taken off the clock per countdown fire.
const COUNTDOWN_STEP: f32 = 1.0;

/// Session parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session length in seconds (default: 120).
    pub duration: f32,
    /// Start a session automatically after spawn (default: true).
    pub auto_start: bool,
    /// Delay before the automatic start in seconds (default: 3).
    pub auto_start_delay: f32,
    /// Half extents of the goal volume (default: [1000, 1000, 500]).
    pub goal_half_extent: Vec3,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration: 120.0,
            auto_start: true,
            auto_start_delay: 3.0,
            goal_half_extent: Vec3::new(1000.0, 1000.0, 500.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionTimer {
    Countdown,
    AutoStart,
}

/// Goal-volume counter and countdown.
#[derive(Debug, Clone)]
pub struct SessionCounter {
    config: SessionConfig,
    remaining_time: f32,
    agents_in_volume: BTreeSet<AgentId>,
    active: bool,
    paused: bool,
    countdown: Option<TimerHandle>,
    auto_start: Option<TimerHandle>,
    timers: TimerService<SessionTimer>,
}

impl SessionCounter {
    /// Create an inactive counter with a full clock.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            remaining_time: config.duration,
            config,
            agents_in_volume: BTreeSet::new(),
            active: false,
            paused: false,
            countdown: None,
            auto_start: None,
            timers: TimerService::new(),
        }
    }

    /// Session parameters.
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Seconds left on the clock.
    pub const fn remaining_time(&self) -> f32 {
        self.remaining_time
    }

    /// Cows currently counted.
    pub fn count(&self) -> usize {
        self.agents_in_volume.len()
    }

    /// The counted cows.
    pub const fn agents(&self) -> &BTreeSet<AgentId> {
        &self.agents_in_volume
    }

    /// Whether a session is running.
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the countdown is paused.
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether an automatic start is pending.
    pub const fn is_auto_start_pending(&self) -> bool {
        self.auto_start.is_some()
    }

    /// Count a cow that entered the goal. Ignored while inactive.
    pub fn register(&mut self, agent: AgentId, events: &mut EventBus) -> bool {
        if !self.active || !self.agents_in_volume.insert(agent) {
            return false;
        }
        debug!(agent = %agent, count = self.count(), "Cow entered goal");
        self.publish_count(events);
        true
    }

    /// Stop counting a cow that left the goal or died. Ignored while
    /// inactive.
    pub fn unregister(&mut self, agent: AgentId, events: &mut EventBus) -> bool {
        if !self.active || !self.agents_in_volume.remove(&agent) {
            return false;
        }
        debug!(agent = %agent, count = self.count(), "Cow left goal");
        self.publish_count(events);
        true
    }

    /// Start a session, counting the cows already in the goal.
    ///
    /// No-op while a session is running.
    pub fn start(&mut self, occupants: impl IntoIterator<Item = AgentId>, events: &mut EventBus) -> bool {
        if self.active {
            debug!("Session already running");
            return false;
        }
        if let Some(handle) = self.auto_start.take() {
            self.timers.cancel(handle);
        }
        self.active = true;
        self.paused = false;
        self.remaining_time = self.config.duration;
        self.agents_in_volume = occupants.into_iter().collect();

        info!(
            duration = self.config.duration,
            count = self.count(),
            "Session started"
        );
        events.publish(HerdEvent::GameStarted {
            duration: self.config.duration,
        });
        events.publish(HerdEvent::TimeUpdated {
            remaining: self.remaining_time,
        });
        self.publish_count(events);

        self.countdown = Some(
            self.timers
                .schedule_repeating(COUNTDOWN_STEP, SessionTimer::Countdown),
        );
        true
    }

    /// End the running session and announce the final count.
    ///
    /// No-op while inactive, so the announcement happens once per session.
    pub fn end(&mut self, events: &mut EventBus) -> bool {
        if !self.active {
            return false;
        }
        if let Some(handle) = self.countdown.take() {
            self.timers.cancel(handle);
        }
        self.active = false;
        self.paused = false;

        let final_count = self.count();
        info!(final_count, remaining = self.remaining_time, "Session ended");
        events.publish(HerdEvent::GameEnded { final_count });
        true
    }

    /// Freeze the countdown. Idempotent.
    pub fn pause(&mut self) -> bool {
        if !self.active || self.paused {
            return false;
        }
        if let Some(handle) = self.countdown {
            self.timers.pause(handle);
        }
        self.paused = true;
        info!(remaining = self.remaining_time, "Session paused");
        true
    }

    /// Continue a paused countdown. Idempotent.
    pub fn resume(&mut self) -> bool {
        if !self.active || !self.paused {
            return false;
        }
        if let Some(handle) = self.countdown {
            self.timers.unpause(handle);
        }
        self.paused = false;
        info!(remaining = self.remaining_time, "Session resumed");
        true
    }

    /// End any running session and start a fresh one.
    pub fn restart(&mut self, occupants: impl IntoIterator<Item = AgentId>, events: &mut EventBus) {
        self.end(events);
        self.start(occupants, events);
    }

    /// Start a session after `delay` seconds. Replaces a pending automatic
    /// start.
    pub fn schedule_auto_start(&mut self, delay: f32) {
        if let Some(stale) = self.auto_start.take() {
            self.timers.cancel(stale);
        }
        debug!(delay, "Session auto-start scheduled");
        self.auto_start = Some(self.timers.schedule(delay, SessionTimer::AutoStart));
    }

    /// Advance the session clock by `dt` seconds.
    ///
    /// `occupants` are the cows in the goal right now; they seed the count
    /// if an automatic start fires during this tick.
    pub fn tick(&mut self, dt: f32, occupants: &BTreeSet<AgentId>, events: &mut EventBus) {
        for fired in self.timers.advance(dt) {
            match fired.payload {
                SessionTimer::AutoStart => {
                    self.auto_start = None;
                    self.start(occupants.iter().copied(), events);
                }
                SessionTimer::Countdown => self.count_down(events),
            }
        }
    }

    fn count_down(&mut self, events: &mut EventBus) {
        if !self.active {
            return;
        }
        self.remaining_time = (self.remaining_time - COUNTDOWN_STEP).max(0.0);
        events.publish(HerdEvent::TimeUpdated {
            remaining: self.remaining_time,
        });
        if self.remaining_time <= 0.0 {
            self.end(events);
        }
    }

    fn publish_count(&self, events: &mut EventBus) {
        events.publish(HerdEvent::CowCountChanged { count: self.count() });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn short(duration: f32) -> SessionCounter {
        SessionCounter::new(SessionConfig {
            duration,
            ..SessionConfig::default()
        })
    }

    fn ended(events: &[HerdEvent]) -> Vec<usize> {
        events
            .iter()
            .filter_map(|e| match e {
                HerdEvent::GameEnded { final_count } => Some(*final_count),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn full_session_ends_exactly_once() {
        let mut session = SessionCounter::new(SessionConfig::default());
        let mut events = EventBus::new();
        let cow = AgentId::new();
        assert!(session.start([cow], &mut events));

        let none = BTreeSet::new();
        for _ in 0..120 {
            session.tick(1.0, &none, &mut events);
        }
        // Extra ticks after the end change nothing.
        for _ in 0..5 {
            session.tick(1.0, &none, &mut events);
        }

        assert!(!session.is_active());
        assert!(session.remaining_time().abs() < f32::EPSILON);
        assert_eq!(ended(events.pending()), vec![1]);
        let updates = events
            .pending()
            .iter()
            .filter(|e| matches!(e, HerdEvent::TimeUpdated { .. }))
            .count();
        // One on start, one per second.
        assert_eq!(updates, 121);
    }

    #[test]
    fn start_announces_state() {
        let mut session = short(30.0);
        let mut events = EventBus::new();
        let cows = [AgentId::new(), AgentId::new()];
        session.start(cows, &mut events);

        assert_eq!(
            events.drain(),
            vec![
                HerdEvent::GameStarted { duration: 30.0 },
                HerdEvent::TimeUpdated { remaining: 30.0 },
                HerdEvent::CowCountChanged { count: 2 },
            ]
        );
        assert!(!session.start([], &mut events));
        assert!(events.is_empty());
    }

    #[test]
    fn register_is_set_semantic_and_inactive_is_ignored() {
        let mut session = short(10.0);
        let mut events = EventBus::new();
        let cow = AgentId::new();

        assert!(!session.register(cow, &mut events));
        assert!(events.is_empty());

        session.start([], &mut events);
        events.drain();
        assert!(session.register(cow, &mut events));
        assert!(!session.register(cow, &mut events));
        assert_eq!(session.count(), 1);
        assert!(session.unregister(cow, &mut events));
        assert!(!session.unregister(cow, &mut events));
        assert_eq!(
            events.drain(),
            vec![
                HerdEvent::CowCountChanged { count: 1 },
                HerdEvent::CowCountChanged { count: 0 },
            ]
        );
    }

    #[test]
    fn end_is_announced_once() {
        let mut session = short(10.0);
        let mut events = EventBus::new();
        assert!(!session.end(&mut events));
        session.start([], &mut events);
        assert!(session.end(&mut events));
        assert!(!session.end(&mut events));
        assert_eq!(ended(events.pending()), vec![0]);
    }

    #[test]
    fn pause_freezes_the_clock() {
        let mut session = short(10.0);
        let mut events = EventBus::new();
        let none = BTreeSet::new();
        assert!(!session.pause());

        session.start([], &mut events);
        session.tick(1.0, &none, &mut events);
        assert!(session.pause());
        assert!(!session.pause());
        for _ in 0..5 {
            session.tick(1.0, &none, &mut events);
        }
        assert!((session.remaining_time() - 9.0).abs() < f32::EPSILON);

        assert!(session.resume());
        assert!(!session.resume());
        session.tick(1.0, &none, &mut events);
        assert!((session.remaining_time() - 8.0).abs() < f32::EPSILON);
    }

    #[test]
    fn sub_second_ticks_count_whole_seconds() {
        let mut session = short(3.0);
        let mut events = EventBus::new();
        let none = BTreeSet::new();
        session.start([], &mut events);
        session.tick(0.5, &none, &mut events);
        assert!((session.remaining_time() - 3.0).abs() < f32::EPSILON);
        session.tick(0.5, &none, &mut events);
        assert!((session.remaining_time() - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn auto_start_seeds_current_occupants() {
        let mut session = short(10.0);
        let mut events = EventBus::new();
        let cow = AgentId::new();
        let inside: BTreeSet<AgentId> = [cow].into_iter().collect();

        session.schedule_auto_start(3.0);
        assert!(session.is_auto_start_pending());
        session.tick(2.0, &inside, &mut events);
        assert!(!session.is_active());
        session.tick(1.0, &inside, &mut events);
        assert!(session.is_active());
        assert!(!session.is_auto_start_pending());
        assert_eq!(session.count(), 1);
    }

    #[test]
    fn restart_ends_then_starts() {
        let mut session = short(10.0);
        let mut events = EventBus::new();
        let none = BTreeSet::new();
        session.start([], &mut events);
        session.tick(4.0, &none, &mut events);
        events.drain();

        session.restart([], &mut events);
        assert!(session.is_active());
        assert!((session.remaining_time() - 10.0).abs() < f32::EPSILON);
        let drained = events.drain();
        assert_eq!(drained.first(), Some(&HerdEvent::GameEnded { final_count: 0 }));
        assert_eq!(drained.get(1), Some(&HerdEvent::GameStarted { duration: 10.0 }));
    }
}
