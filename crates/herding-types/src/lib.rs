//! Shared type definitions for the herding simulation.
//!
//! This crate is the single source of truth for the identifiers, enums and
//! notifications that flow between the world substrate, the steering agents
//! and the game-rule components.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for agents and hazards
//! - [`enums`] -- Agent kinds, shepherd modes, trap states, kill causes
//! - [`events`] -- Notifications published onto the event bus

pub mod enums;
pub mod events;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use enums::{
    AgentKind, AttractionState, HazardKind, KillCause, MovementMode, QueryChannel, ShepherdMode,
    SuspensionReason, TrapState,
};
pub use events::HerdEvent;
pub use ids::{AgentId, TrapId};
