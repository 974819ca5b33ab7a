//! World substrate for the herding simulation.
//!
//! Everything gameplay code needs from its host engine lives behind the
//! contracts in this crate: spatial queries, motion intents, deferred
//! timers, and the event channel. [`SimWorld`] is a small kinematic
//! implementation of the spatial and motion contracts over box terrain so
//! the simulation runs headless.
//!
//! # Modules
//!
//! - [`error`] -- Error types for world registry operations.
//! - [`events`] -- [`EventBus`], the fire-and-forget notification channel.
//! - [`geometry`] -- [`Aabb`], [`Pose`], and interpolation helpers.
//! - [`motion`] -- [`MotionSubstrate`], the write-side movement contract.
//! - [`sim_world`] -- [`SimWorld`], the in-memory reference substrate.
//! - [`spatial`] -- [`SpatialQuery`], overlaps and ray traces.
//! - [`terrain`] -- [`Terrain`], static geometry made of solid boxes.
//! - [`timer`] -- [`TimerService`], handle-keyed deferred payloads.
//! - [`volume`] -- [`OverlapWatcher`], begin/end tracking for trigger boxes.

pub mod error;
pub mod events;
pub mod geometry;
pub mod motion;
pub mod sim_world;
pub mod spatial;
pub mod terrain;
pub mod timer;
pub mod volume;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use events::EventBus;
pub use geometry::{Aabb, Pose};
pub use motion::MotionSubstrate;
pub use sim_world::{Body, PhysicsConfig, SimWorld};
pub use spatial::{Hit, SpatialQuery};
pub use terrain::Terrain;
pub use timer::{Fired, TimerHandle, TimerService};
pub use volume::{OverlapEvent, OverlapWatcher};
