//! Gameplay notifications.
//!
//! Components publish [`HerdEvent`]s onto the event bus as fire-and-forget
//! notifications. HUD, audio and analytics layers consume them; nothing in
//! the simulation reads them back.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::enums::{HazardKind, KillCause, ShepherdMode};
use crate::ids::{AgentId, TrapId};

/// A notification emitted during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HerdEvent {
    // --- Shepherd ---
    /// The shepherd's interaction mode changed.
    ModeChanged {
        /// Mode before the change.
        previous: ShepherdMode,
        /// Mode after the change.
        current: ShepherdMode,
    },
    /// The laser was switched on or off.
    LaserToggled {
        /// Whether the laser is now on.
        active: bool,
    },
    /// A cow was picked up.
    CowPickedUp {
        /// The carried cow.
        agent: AgentId,
    },
    /// A carried cow was set down without a throw.
    CowDropped {
        /// The released cow.
        agent: AgentId,
    },
    /// A carried cow was thrown.
    CowThrown {
        /// The thrown cow.
        agent: AgentId,
        /// Launch velocity.
        velocity: Vec3,
        /// Charge fraction in `[0, 1]`.
        power: f32,
    },

    // --- Hazards ---
    /// A hazard finished arming.
    TrapArmed {
        /// The hazard.
        trap: TrapId,
    },
    /// A qualifying agent set a hazard off.
    TrapTriggered {
        /// The hazard.
        trap: TrapId,
        /// Hazard variant.
        kind: HazardKind,
        /// The agent that stepped in.
        agent: AgentId,
    },
    /// A hazard entered its active phase.
    TrapActivated {
        /// The hazard.
        trap: TrapId,
    },
    /// A hazard left its active phase.
    TrapDeactivated {
        /// The hazard.
        trap: TrapId,
    },
    /// A hazard was switched off.
    TrapDisabled {
        /// The hazard.
        trap: TrapId,
    },
    /// A landmine beeped while arming.
    MineArmingBeep {
        /// The landmine.
        trap: TrapId,
        /// Seconds until the next beep.
        interval: f32,
    },
    /// A landmine detonated.
    MineExploded {
        /// The landmine.
        trap: TrapId,
        /// Blast center.
        position: Vec3,
    },
    /// A cow was thrown clear by a blast.
    CowLaunched {
        /// The landmine.
        trap: TrapId,
        /// The launched cow.
        agent: AgentId,
        /// Launch velocity.
        velocity: Vec3,
    },
    /// A spike trap started its warning phase.
    SpikeWarning {
        /// The spike trap.
        trap: TrapId,
        /// Warning length in seconds.
        duration: f32,
    },
    /// A cow was destroyed.
    CowKilled {
        /// The dead cow.
        agent: AgentId,
        /// What killed it.
        cause: KillCause,
    },

    // --- Session ---
    /// A timed session began.
    GameStarted {
        /// Session length in seconds.
        duration: f32,
    },
    /// The countdown advanced.
    TimeUpdated {
        /// Seconds remaining.
        remaining: f32,
    },
    /// The number of cows in the goal volume changed.
    CowCountChanged {
        /// Cows currently counted.
        count: usize,
    },
    /// The session ended.
    GameEnded {
        /// Cows counted at the end.
        final_count: usize,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = HerdEvent::CowKilled {
            agent: AgentId::new(),
            cause: KillCause::Spikes,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "cow_killed");
        assert_eq!(json["cause"], "Spikes");
    }

    #[test]
    fn vectors_serialize_as_arrays() {
        let event = HerdEvent::MineExploded {
            trap: TrapId::new(),
            position: Vec3::new(1.0, 2.0, 3.0),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: HerdEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert!(json.contains("[1.0,2.0,3.0]"));
    }
}
