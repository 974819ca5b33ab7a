//! Cow steering, herd registry, and shepherd controller.
//!
//! This crate holds the per-agent behaviour of the herding simulation. It
//! reads and writes the world only through the contracts in
//! `herding-world`, so it runs the same against [`SimWorld`] or any other
//! substrate.
//!
//! # Modules
//!
//! - [`config`] -- Steering and shepherd tunables ([`SteeringConfig`], [`ShepherdConfig`])
//! - [`error`] -- Error types for herd registry operations ([`AgentError`])
//! - [`flags`] -- Mutually exclusive attraction/repulsion flags ([`InteractionFlags`])
//! - [`herd`] -- Live cow registry and steering suspension ([`Herd`])
//! - [`shepherd`] -- Modes, pickup/carry/throw, and the laser ([`InteractionController`])
//! - [`steering`] -- Per-cow weighted steering ([`SteeringAgent`])
//!
//! [`SimWorld`]: herding_world::SimWorld

pub mod config;
pub mod error;
pub mod flags;
pub mod herd;
pub mod shepherd;
pub mod steering;

// Re-export primary types at crate root for convenience.
pub use config::{ShepherdConfig, SteeringConfig};
pub use error::AgentError;
pub use flags::InteractionFlags;
pub use herd::{Cow, Herd};
pub use shepherd::{CarryState, InteractionController, LaserState};
pub use steering::{InteractionView, SteeringAgent, SteeringForces, shaped_speed};
