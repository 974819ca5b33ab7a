//! Notification channel for gameplay events.
//!
//! Producers publish [`HerdEvent`]s as fire-and-forget notifications. The
//! tick cycle drains the bus once per tick into its summary, so every event
//! is delivered exactly once and in publication order.

use herding_types::HerdEvent;
use tracing::debug;

/// Ordered buffer of events published since the last drain.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    pending: Vec<HerdEvent>,
}

impl EventBus {
    /// Create an empty bus.
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Publish an event.
    pub fn publish(&mut self, event: HerdEvent) {
        debug!(?event, "Event published");
        self.pending.push(event);
    }

    /// Events published since the last drain.
    pub fn pending(&self) -> &[HerdEvent] {
        &self.pending
    }

    /// Take every pending event, leaving the bus empty.
    pub fn drain(&mut self) -> Vec<HerdEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no events are pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
