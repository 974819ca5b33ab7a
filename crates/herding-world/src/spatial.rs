//! Read-only spatial queries against the world.
//!
//! [`SpatialQuery`] is the seam between gameplay code and whatever
//! collision engine hosts the simulation. [`SimWorld`] is the in-memory
//! implementation used headless and in tests.
//!
//! [`SimWorld`]: crate::sim_world::SimWorld

use glam::Vec3;
use herding_types::{AgentId, AgentKind, QueryChannel};

use crate::geometry::{Aabb, Pose};

/// A ray query result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Impact point.
    pub point: Vec3,
    /// Surface normal at the impact point.
    pub normal: Vec3,
    /// Distance from the ray origin.
    pub distance: f32,
    /// The body that was hit, if the ray struck an agent rather than terrain.
    pub agent: Option<AgentId>,
}

/// Read-only spatial queries.
///
/// Every query silently ignores bodies with collision disabled, which is
/// how a carried cow drops out of overlaps and traces.
pub trait SpatialQuery {
    /// Bodies whose position lies within `radius` of `center`, optionally
    /// filtered by kind.
    fn overlap_sphere(&self, center: Vec3, radius: f32, kind: Option<AgentKind>) -> Vec<AgentId>;

    /// Bodies whose position lies inside `bounds`, optionally filtered by kind.
    fn overlap_box(&self, bounds: &Aabb, kind: Option<AgentKind>) -> Vec<AgentId>;

    /// Nearest hit along a ray. `direction` need not be normalized; a zero
    /// direction never hits.
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        channel: QueryChannel,
        ignore: Option<AgentId>,
    ) -> Option<Hit>;

    /// Current pose of a body, or `None` if it no longer exists.
    fn pose(&self, agent: AgentId) -> Option<Pose>;

    /// Kind of a body, or `None` if it no longer exists.
    fn kind(&self, agent: AgentId) -> Option<AgentKind>;

    /// Liveness check for a stored agent reference.
    fn exists(&self, agent: AgentId) -> bool {
        self.pose(agent).is_some()
    }
}
