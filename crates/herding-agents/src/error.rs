//! Error types for the `herding-agents` crate.
//!
//! Steering itself never fails; only herd registry operations return
//! [`AgentError`].

use herding_types::AgentId;

/// Errors that can occur during herd registry operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A cow with this ID is already registered.
    #[error("cow already registered: {0}")]
    DuplicateAgent(AgentId),

    /// No live cow with this ID is registered.
    #[error("cow not found: {0}")]
    AgentNotFound(AgentId),

    /// The world has no body for this cow.
    #[error("cow {0} has no body in the world")]
    MissingBody(AgentId),
}
