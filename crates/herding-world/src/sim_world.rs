//! In-memory reference substrate.
//!
//! [`SimWorld`] owns every body and the static [`Terrain`], answers
//! [`SpatialQuery`] calls, accepts [`MotionSubstrate`] intents, and
//! integrates bodies once per tick in [`SimWorld::step`]. The physics is a
//! deliberately small kinematic model: walking bodies move at their speed
//! cap along accumulated input and stick to the ground, falling bodies
//! follow a ballistic arc until they land or drop below the kill height.

use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use herding_types::{AgentId, AgentKind, MovementMode, QueryChannel};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::WorldError;
use crate::geometry::{Aabb, KINDA_SMALL, Pose, flatten};
use crate::motion::MotionSubstrate;
use crate::spatial::{Hit, SpatialQuery};
use crate::terrain::Terrain;

/// Tunables for the kinematic model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration while falling, units/s².
    pub gravity: f32,
    /// Bodies below this height are removed.
    pub kill_z: f32,
    /// Tallest ledge a walking body steps onto.
    pub step_height: f32,
    /// Collision radius of every body.
    pub body_radius: f32,
    /// Default walk speed cap for new bodies.
    pub default_walk_speed: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 980.0,
            kill_z: -2000.0,
            step_height: 45.0,
            body_radius: 40.0,
            default_walk_speed: 600.0,
        }
    }
}

/// A simulated body.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    /// Body identifier.
    pub id: AgentId,
    /// Cow or shepherd.
    pub kind: AgentKind,
    /// Feet position.
    pub position: Vec3,
    /// Orientation.
    pub rotation: Quat,
    /// Current velocity.
    pub velocity: Vec3,
    /// Walking or falling.
    pub mode: MovementMode,
    /// Walk speed cap.
    pub max_walk_speed: f32,
    /// Whether the body collides and shows up in queries.
    pub collision_enabled: bool,
    /// Whether integration is frozen.
    pub movement_suspended: bool,
    pending_input: Vec3,
}

impl Body {
    /// Pose snapshot.
    pub const fn pose(&self) -> Pose {
        Pose {
            position: self.position,
            rotation: self.rotation,
        }
    }

    /// Movement input accumulated since the last step.
    pub const fn pending_input(&self) -> Vec3 {
        self.pending_input
    }
}

/// In-memory world: terrain plus bodies.
#[derive(Debug, Clone, Default)]
pub struct SimWorld {
    terrain: Terrain,
    physics: PhysicsConfig,
    bodies: BTreeMap<AgentId, Body>,
}

impl SimWorld {
    /// Create an empty world over the given terrain.
    pub const fn new(terrain: Terrain, physics: PhysicsConfig) -> Self {
        Self {
            terrain,
            physics,
            bodies: BTreeMap::new(),
        }
    }

    /// Static geometry.
    pub const fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    /// Physics tunables.
    pub const fn physics(&self) -> &PhysicsConfig {
        &self.physics
    }

    /// Spawn a body, snapping it onto the ground below `position`.
    pub fn spawn(&mut self, kind: AgentKind, position: Vec3) -> Result<AgentId, WorldError> {
        let id = AgentId::new();
        self.spawn_with_id(id, kind, position)?;
        Ok(id)
    }

    /// Spawn a body under a caller-chosen ID.
    pub fn spawn_with_id(
        &mut self,
        id: AgentId,
        kind: AgentKind,
        position: Vec3,
    ) -> Result<(), WorldError> {
        if self.bodies.contains_key(&id) {
            return Err(WorldError::DuplicateBody(id));
        }
        let ground = self
            .terrain
            .ground_height(position, self.physics.step_height)
            .ok_or(WorldError::NoGround {
                x: position.x,
                y: position.y,
                z: position.z,
            })?;
        let body = Body {
            id,
            kind,
            position: Vec3::new(position.x, position.y, ground),
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            mode: MovementMode::Walking,
            max_walk_speed: self.physics.default_walk_speed,
            collision_enabled: true,
            movement_suspended: false,
            pending_input: Vec3::ZERO,
        };
        debug!(agent = %id, ?kind, x = body.position.x, y = body.position.y, "Body spawned");
        self.bodies.insert(id, body);
        Ok(())
    }

    /// Look up a body.
    pub fn body(&self, id: AgentId) -> Result<&Body, WorldError> {
        self.bodies.get(&id).ok_or(WorldError::BodyNotFound(id))
    }

    /// All bodies in ID order.
    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.values()
    }

    /// Number of bodies of the given kind.
    pub fn count(&self, kind: AgentKind) -> usize {
        self.bodies.values().filter(|b| b.kind == kind).count()
    }

    /// Integrate every body by `dt` seconds.
    ///
    /// Returns the bodies that fell below the kill height; they have
    /// already been removed.
    pub fn step(&mut self, dt: f32) -> Vec<AgentId> {
        let mut fallen = Vec::new();
        for body in self.bodies.values_mut() {
            if body.movement_suspended {
                body.pending_input = Vec3::ZERO;
                continue;
            }
            match body.mode {
                MovementMode::Walking => walk(body, &self.terrain, &self.physics, dt),
                MovementMode::Falling => fall(body, &self.terrain, &self.physics, dt),
            }
            if body.position.z < self.physics.kill_z {
                fallen.push(body.id);
            }
        }
        for id in &fallen {
            self.bodies.remove(id);
            info!(agent = %id, "Body fell out of the world");
        }
        fallen
    }

    fn queryable(&self, kind: Option<AgentKind>) -> impl Iterator<Item = &Body> {
        self.bodies
            .values()
            .filter(move |b| b.collision_enabled && kind.is_none_or(|k| b.kind == k))
    }
}

fn walk(body: &mut Body, terrain: &Terrain, physics: &PhysicsConfig, dt: f32) {
    let input = flatten(body.pending_input).clamp_length_max(1.0);
    body.pending_input = Vec3::ZERO;

    let mut velocity = input * body.max_walk_speed;
    let mut delta = velocity * dt;
    let travel = delta.length();
    if body.collision_enabled && travel > KINDA_SMALL {
        let direction = delta / travel;
        let probe = body.position + Vec3::Z * physics.step_height;
        if let Some(hit) = terrain.raycast(probe, direction, travel + physics.body_radius) {
            let allowed = (hit.distance - physics.body_radius).max(0.0);
            delta = direction * allowed;
            velocity = Vec3::ZERO;
        }
    }

    let next = body.position + delta;
    body.velocity = velocity;
    match terrain.ground_height(next, physics.step_height) {
        Some(height) if height >= next.z - physics.step_height => {
            body.position = Vec3::new(next.x, next.y, height);
        }
        _ => {
            body.position = next;
            body.mode = MovementMode::Falling;
        }
    }
}

fn fall(body: &mut Body, terrain: &Terrain, physics: &PhysicsConfig, dt: f32) {
    body.pending_input = Vec3::ZERO;
    body.velocity.z -= physics.gravity * dt;
    let next = body.position + body.velocity * dt;

    if body.velocity.z <= 0.0 {
        let column = Vec3::new(next.x, next.y, body.position.z);
        if let Some(height) = terrain.ground_height(column, 1.0) {
            if next.z <= height {
                body.position = Vec3::new(next.x, next.y, height);
                body.velocity = Vec3::ZERO;
                body.mode = MovementMode::Walking;
                return;
            }
        }
    }
    body.position = next;
}

fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let offset = origin - center;
    let b = offset.dot(direction);
    let c = radius.mul_add(-radius, offset.length_squared());
    if c > 0.0 && b > 0.0 {
        return None;
    }
    let discriminant = b.mul_add(b, -c);
    if discriminant < 0.0 {
        return None;
    }
    let t = -b - discriminant.sqrt();
    (t >= 0.0).then_some(t)
}

impl SpatialQuery for SimWorld {
    fn overlap_sphere(&self, center: Vec3, radius: f32, kind: Option<AgentKind>) -> Vec<AgentId> {
        let radius_sq = radius * radius;
        self.queryable(kind)
            .filter(|b| b.position.distance_squared(center) <= radius_sq)
            .map(|b| b.id)
            .collect()
    }

    fn overlap_box(&self, bounds: &Aabb, kind: Option<AgentKind>) -> Vec<AgentId> {
        self.queryable(kind)
            .filter(|b| bounds.contains(b.position))
            .map(|b| b.id)
            .collect()
    }

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        channel: QueryChannel,
        ignore: Option<AgentId>,
    ) -> Option<Hit> {
        let direction = direction.try_normalize()?;
        let terrain_hit = self.terrain.raycast(origin, direction, max_distance);
        if channel == QueryChannel::WorldStatic {
            return terrain_hit;
        }

        let radius = self.physics.body_radius;
        let body_hit = self
            .queryable(None)
            .filter(|b| Some(b.id) != ignore)
            .filter_map(|b| {
                let center = b.position + Vec3::Z * radius;
                ray_sphere(origin, direction, center, radius)
                    .filter(|t| *t <= max_distance)
                    .map(|t| {
                        let point = origin + direction * t;
                        Hit {
                            point,
                            normal: (point - center).normalize_or_zero(),
                            distance: t,
                            agent: Some(b.id),
                        }
                    })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance));

        match (terrain_hit, body_hit) {
            (Some(t), Some(b)) => Some(if b.distance < t.distance { b } else { t }),
            (t, b) => t.or(b),
        }
    }

    fn pose(&self, agent: AgentId) -> Option<Pose> {
        self.bodies.get(&agent).map(Body::pose)
    }

    fn kind(&self, agent: AgentId) -> Option<AgentKind> {
        self.bodies.get(&agent).map(|b| b.kind)
    }
}

impl MotionSubstrate for SimWorld {
    fn add_movement_input(&mut self, agent: AgentId, direction: Vec3) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.pending_input += direction;
        }
    }

    fn max_walk_speed(&self, agent: AgentId) -> Option<f32> {
        self.bodies.get(&agent).map(|b| b.max_walk_speed)
    }

    fn set_max_walk_speed(&mut self, agent: AgentId, speed: f32) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.max_walk_speed = speed.max(0.0);
        }
    }

    fn velocity(&self, agent: AgentId) -> Option<Vec3> {
        self.bodies.get(&agent).map(|b| b.velocity)
    }

    fn set_velocity(&mut self, agent: AgentId, velocity: Vec3) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.velocity = velocity;
        }
    }

    fn set_rotation(&mut self, agent: AgentId, rotation: Quat) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.rotation = rotation;
        }
    }

    fn set_position(&mut self, agent: AgentId, position: Vec3) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.position = position;
        }
    }

    fn movement_mode(&self, agent: AgentId) -> Option<MovementMode> {
        self.bodies.get(&agent).map(|b| b.mode)
    }

    fn set_falling_mode(&mut self, agent: AgentId) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.mode = MovementMode::Falling;
        }
    }

    fn set_movement_suspended(&mut self, agent: AgentId, suspended: bool) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.movement_suspended = suspended;
            if suspended {
                body.velocity = Vec3::ZERO;
            }
        }
    }

    fn set_collision_enabled(&mut self, agent: AgentId, enabled: bool) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.collision_enabled = enabled;
        }
    }

    fn despawn(&mut self, agent: AgentId) -> bool {
        self.bodies.remove(&agent).is_some()
    }
}
