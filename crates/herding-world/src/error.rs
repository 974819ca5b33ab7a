//! Error types for the `herding-world` crate.
//!
//! Gameplay-facing substrate calls never fail (unknown bodies are ignored);
//! only explicit registry operations on [`SimWorld`] return [`WorldError`].
//!
//! [`SimWorld`]: crate::sim_world::SimWorld

use herding_types::AgentId;

/// Errors that can occur during world registry operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A body with this ID already exists.
    #[error("body already exists: {0}")]
    DuplicateBody(AgentId),

    /// No body with this ID exists.
    #[error("body not found: {0}")]
    BodyNotFound(AgentId),

    /// A spawn point has no ground beneath it.
    #[error("no ground below spawn point ({x}, {y}, {z})")]
    NoGround {
        /// Spawn X.
        x: f32,
        /// Spawn Y.
        y: f32,
        /// Spawn Z.
        z: f32,
    },
}
