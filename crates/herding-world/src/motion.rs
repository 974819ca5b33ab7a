//! Write-side contract for moving bodies.
//!
//! Gameplay code never integrates positions itself: it submits intents
//! (movement input, speed caps, forced velocities) and the substrate
//! applies them during its own step. Calls naming a body that no longer
//! exists are ignored.

use glam::{Quat, Vec3};
use herding_types::{AgentId, MovementMode};

/// Movement requests accepted by the host physics.
pub trait MotionSubstrate {
    /// Accumulate a movement input direction for this step.
    fn add_movement_input(&mut self, agent: AgentId, direction: Vec3);

    /// Current walk speed cap, or `None` for an unknown body.
    fn max_walk_speed(&self, agent: AgentId) -> Option<f32>;

    /// Set the walk speed cap.
    fn set_max_walk_speed(&mut self, agent: AgentId, speed: f32);

    /// Current velocity, or `None` for an unknown body.
    fn velocity(&self, agent: AgentId) -> Option<Vec3>;

    /// Overwrite the velocity.
    fn set_velocity(&mut self, agent: AgentId, velocity: Vec3);

    /// Overwrite the orientation.
    fn set_rotation(&mut self, agent: AgentId, rotation: Quat);

    /// Teleport the body.
    fn set_position(&mut self, agent: AgentId, position: Vec3);

    /// Current movement mode, or `None` for an unknown body.
    fn movement_mode(&self, agent: AgentId) -> Option<MovementMode>;

    /// Switch to ballistic movement until the body lands.
    fn set_falling_mode(&mut self, agent: AgentId);

    /// Freeze or unfreeze integration for the body.
    fn set_movement_suspended(&mut self, agent: AgentId, suspended: bool);

    /// Include or exclude the body from collision and spatial queries.
    fn set_collision_enabled(&mut self, agent: AgentId, enabled: bool);

    /// Remove the body from the world. Returns whether it existed.
    fn despawn(&mut self, agent: AgentId) -> bool;
}
