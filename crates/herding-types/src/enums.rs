//! Enumeration types for the herding simulation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

/// The kind of body occupying the world.
///
/// Spatial queries filter on this so steering only ever sees peers of its
/// own kind and hazards can ignore the shepherd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    /// A herd creature driven by steering.
    Cow,
    /// The controllable agent.
    Shepherd,
}

/// How the motion substrate integrates a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MovementMode {
    /// Grounded movement driven by movement input and max walk speed.
    #[default]
    Walking,
    /// Ballistic movement under gravity until the body lands.
    Falling,
}

/// Why an agent's steering is currently paused.
///
/// An agent steers only while it holds no suspension. Every suspension is
/// lifted by the same party that added it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SuspensionReason {
    /// Held by the shepherd.
    Carried,
    /// In flight after a throw, until the grace delay elapses.
    Thrown,
    /// In flight after a landmine blast.
    Launched,
}

/// Collision channel used by ray queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryChannel {
    /// Static terrain only (walls, ground, cliffs).
    WorldStatic,
    /// Terrain plus any body with collision enabled.
    Visibility,
}

// ---------------------------------------------------------------------------
// Shepherd interaction
// ---------------------------------------------------------------------------

/// Interaction mode of the controllable agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShepherdMode {
    /// No influence on the herd.
    #[default]
    Neutral,
    /// Nearby cows walk toward the shepherd.
    Attraction,
    /// Nearby cows flee from the shepherd.
    Repulsion,
    /// Cows near the laser impact point walk toward it.
    LaserAttraction,
}

impl ShepherdMode {
    /// Whether cows react to the shepherd's own position in this mode.
    pub const fn influences_by_presence(self) -> bool {
        matches!(self, Self::Attraction | Self::Repulsion)
    }
}

/// Derived attraction state of a single cow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttractionState {
    /// Unaffected by the shepherd.
    #[default]
    None,
    /// Drawn toward the shepherd (or the laser point).
    Attracted,
    /// Pushed away from the shepherd.
    Repulsed,
}

// ---------------------------------------------------------------------------
// Hazards
// ---------------------------------------------------------------------------

/// Which hazard variant a trap is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardKind {
    /// Blast that launches or kills cows within a radius.
    Landmine,
    /// Spikes that kill cows standing in the trigger volume.
    Spike,
}

/// Lifecycle state of a hazard.
///
/// Legal transitions:
///
/// | From | To |
/// |---|---|
/// | `Idle` | `Armed`, `Disabled` |
/// | `Armed` | `Triggered`, `Disabled` |
/// | `Triggered` | `Active`, `Disabled` |
/// | `Active` | `Cooldown`, `Disabled` |
/// | `Cooldown` | `Armed`, `Disabled` |
/// | `Disabled` | none (only a reset leaves it) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TrapState {
    /// Placed but not yet armed.
    #[default]
    Idle,
    /// Waiting for a qualifying agent.
    Armed,
    /// Triggered, waiting out the activation delay.
    Triggered,
    /// Doing its damage.
    Active,
    /// Recovering before re-arming.
    Cooldown,
    /// Permanently off until reset.
    Disabled,
}

impl TrapState {
    /// Every state, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Idle,
        Self::Armed,
        Self::Triggered,
        Self::Active,
        Self::Cooldown,
        Self::Disabled,
    ];

    /// States reachable from `self` in a single transition.
    pub const fn legal_successors(self) -> &'static [Self] {
        match self {
            Self::Idle => &[Self::Armed, Self::Disabled],
            Self::Armed => &[Self::Triggered, Self::Disabled],
            Self::Triggered => &[Self::Active, Self::Disabled],
            Self::Active => &[Self::Cooldown, Self::Disabled],
            Self::Cooldown => &[Self::Armed, Self::Disabled],
            Self::Disabled => &[],
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: Self) -> bool {
        self.legal_successors().contains(&next)
    }
}

/// What killed a cow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KillCause {
    /// Inside a landmine's kill radius.
    Explosion,
    /// Impaled by an extended spike trap.
    Spikes,
    /// Fell below the world's kill height.
    FellOutOfWorld,
}
