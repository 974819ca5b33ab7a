//! Deferred events keyed by handle.
//!
//! A [`TimerService`] replaces fire-and-forget closures with data: each
//! timer carries a payload that [`TimerService::advance`] hands back when
//! it comes due, and the owner decides what to do with it. Cancelling is
//! explicit and idempotent, so an owner can always cancel a handle it
//! stored without first checking whether the timer already fired.

use std::collections::BTreeMap;

/// Opaque handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Entry<T> {
    payload: T,
    remaining: f32,
    period: Option<f32>,
    paused: bool,
}

/// A timer that came due during [`TimerService::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<T> {
    /// The handle the timer was scheduled under.
    pub handle: TimerHandle,
    /// The payload supplied at scheduling time.
    pub payload: T,
}

/// One-shot and repeating timers advanced by the tick cycle.
#[derive(Debug, Clone)]
pub struct TimerService<T> {
    entries: BTreeMap<TimerHandle, Entry<T>>,
    next_handle: u64,
}

impl<T> Default for TimerService<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_handle: 0,
        }
    }
}

impl<T: Clone> TimerService<T> {
    /// Create an empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `payload` once after `delay` seconds.
    pub fn schedule(&mut self, delay: f32, payload: T) -> TimerHandle {
        self.insert(delay.max(0.0), None, payload)
    }

    /// Fire `payload` every `period` seconds, first after one period.
    ///
    /// A non-positive period degrades to a one-shot that fires on the next
    /// advance.
    pub fn schedule_repeating(&mut self, period: f32, payload: T) -> TimerHandle {
        let period = (period > 0.0).then_some(period);
        self.insert(period.unwrap_or(0.0), period, payload)
    }

    fn insert(&mut self, remaining: f32, period: Option<f32>, payload: T) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle = self.next_handle.saturating_add(1);
        self.entries.insert(
            handle,
            Entry {
                payload,
                remaining,
                period,
                paused: false,
            },
        );
        handle
    }

    /// Cancel a timer. Returns whether it was still pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.entries.remove(&handle).is_some()
    }

    /// Cancel every timer whose payload matches `predicate`.
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !predicate(&entry.payload));
        before.saturating_sub(self.entries.len())
    }

    /// Number of pending timers whose payload matches `predicate`.
    pub fn count_where(&self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        self.entries.values().filter(|entry| predicate(&entry.payload)).count()
    }

    /// Whether a timer is still pending.
    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// Seconds until a pending timer next fires.
    pub fn remaining(&self, handle: TimerHandle) -> Option<f32> {
        self.entries.get(&handle).map(|e| e.remaining)
    }

    /// Freeze a timer in place. Returns whether it was pending.
    pub fn pause(&mut self, handle: TimerHandle) -> bool {
        self.set_paused(handle, true)
    }

    /// Resume a frozen timer. Returns whether it was pending.
    pub fn unpause(&mut self, handle: TimerHandle) -> bool {
        self.set_paused(handle, false)
    }

    /// Whether a pending timer is frozen.
    pub fn is_paused(&self, handle: TimerHandle) -> bool {
        self.entries.get(&handle).is_some_and(|e| e.paused)
    }

    fn set_paused(&mut self, handle: TimerHandle, paused: bool) -> bool {
        let Some(entry) = self.entries.get_mut(&handle) else {
            return false;
        };
        entry.paused = paused;
        true
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no timers are pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Advance every running timer by `dt` seconds.
    ///
    /// Returns the timers that came due in the order they would have fired;
    /// ties fire in scheduling order. A repeating timer fires once per
    /// elapsed period.
    pub fn advance(&mut self, dt: f32) -> Vec<Fired<T>> {
        let mut due: Vec<(f32, TimerHandle, T)> = Vec::new();
        let mut expired: Vec<TimerHandle> = Vec::new();

        for (handle, entry) in &mut self.entries {
            if entry.paused {
                continue;
            }
            let mut at = entry.remaining;
            while at <= dt {
                due.push((at, *handle, entry.payload.clone()));
                match entry.period {
                    Some(period) => at += period,
                    None => {
                        expired.push(*handle);
                        break;
                    }
                }
            }
            entry.remaining = at - dt;
        }
        for handle in expired {
            self.entries.remove(&handle);
        }

        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        due.into_iter()
            .map(|(_, handle, payload)| Fired { handle, payload })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Job {
        A,
        B,
        Tick,
    }

    fn payloads(fired: Vec<Fired<Job>>) -> Vec<Job> {
        fired.into_iter().map(|f| f.payload).collect()
    }

    #[test]
    fn one_shot_fires_once_after_delay() {
        let mut timers = TimerService::new();
        let handle = timers.schedule(0.5, Job::A);
        assert!(timers.advance(0.25).is_empty());
        assert!(timers.is_active(handle));
        assert!((timers.remaining(handle).unwrap() - 0.25).abs() < 1e-6);
        assert_eq!(payloads(timers.advance(0.25)), vec![Job::A]);
        assert!(!timers.is_active(handle));
        assert!(timers.advance(10.0).is_empty());
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut timers = TimerService::new();
        let handle = timers.schedule(1.0, Job::A);
        assert!(timers.cancel(handle));
        assert!(!timers.cancel(handle));
        assert!(timers.advance(2.0).is_empty());
    }

    #[test]
    fn cancel_after_fire_is_harmless() {
        let mut timers = TimerService::new();
        let handle = timers.schedule(0.1, Job::A);
        assert_eq!(timers.advance(0.2).len(), 1);
        assert!(!timers.cancel(handle));
    }

    #[test]
    fn fires_in_due_order_within_one_advance() {
        let mut timers = TimerService::new();
        timers.schedule(0.3, Job::B);
        timers.schedule(0.1, Job::A);
        assert_eq!(payloads(timers.advance(1.0)), vec![Job::A, Job::B]);
    }

    #[test]
    fn repeating_fires_every_period() {
        let mut timers = TimerService::new();
        let handle = timers.schedule_repeating(1.0, Job::Tick);
        let mut count = 0;
        for _ in 0..10 {
            count += timers.advance(0.5).len();
        }
        assert_eq!(count, 5);
        assert!(timers.is_active(handle));
    }

    #[test]
    fn repeating_catches_up_on_large_steps() {
        let mut timers = TimerService::new();
        timers.schedule_repeating(1.0, Job::Tick);
        assert_eq!(timers.advance(3.5).len(), 3);
    }

    #[test]
    fn paused_timers_hold_their_remaining_time() {
        let mut timers = TimerService::new();
        let handle = timers.schedule(1.0, Job::A);
        timers.advance(0.4);
        assert!(timers.pause(handle));
        assert!(timers.advance(5.0).is_empty());
        assert!(timers.is_paused(handle));
        assert!(timers.unpause(handle));
        assert!(timers.advance(0.5).is_empty());
        assert_eq!(payloads(timers.advance(0.2)), vec![Job::A]);
    }

    #[test]
    fn cancel_where_matches_payloads() {
        let mut timers = TimerService::new();
        timers.schedule(1.0, Job::A);
        timers.schedule(1.0, Job::B);
        timers.schedule(2.0, Job::A);
        assert_eq!(timers.cancel_where(|job| *job == Job::A), 2);
        assert_eq!(timers.len(), 1);
    }
}
