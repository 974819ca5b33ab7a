//! Per-cow boids steering.
//!
//! Each tick a [`SteeringAgent`] picks a target speed, sums weighted
//! steering forces, integrates its own velocity, and hands the result to
//! the motion substrate as a movement direction plus a walk speed cap.
//!
//! # Force priority
//!
//! 1. Obstacle and cliff avoidance, boosted by the safety multiplier while
//!    active.
//! 2. Separation from nearby cows (never attenuated).
//! 3. Shepherd interaction: laser, then repulsion, then attraction. Scaled
//!    down while avoiding.
//! 4. Wander, only when nothing else is steering the cow.
//!
//! The combined force is clamped to `max_steer_force`.

use glam::{Vec2, Vec3};
use herding_types::{AgentId, AgentKind, AttractionState, QueryChannel, ShepherdMode};
use herding_world::geometry::{flatten, interp_rotation_to, interp_to, yaw_rotation};
use herding_world::{MotionSubstrate, Pose, SpatialQuery};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::SteeringConfig;
use crate::flags::InteractionFlags;

/// Squared speed below which a cow neither moves nor turns.
const MIN_MOVE_SPEED_SQ: f32 = 0.1;

/// Height above a ground probe point where the downward probe starts.
const GROUND_PROBE_RISE: f32 = 100.0;

/// Total length of a downward ground probe.
const GROUND_PROBE_LENGTH: f32 = 600.0;

/// Multiplier on current velocity used as the braking force inside a stop
/// band.
const BRAKE_FACTOR: f32 = 2.0;

/// What a cow can see of the shepherd this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionView {
    /// Current shepherd mode.
    pub mode: ShepherdMode,
    /// Shepherd feet position.
    pub position: Vec3,
    /// Laser impact point, present only while the laser is on and hitting
    /// something.
    pub laser_target: Option<Vec3>,
    /// Cows within this distance of the laser point follow it.
    pub laser_attraction_radius: f32,
}

/// Weighted steering contributions from one tick.
///
/// `total` is the clamped sum the agent integrated.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SteeringForces {
    /// Wall avoidance after weighting.
    pub obstacle: Vec3,
    /// Cliff avoidance after weighting.
    pub cliff: Vec3,
    /// Separation after weighting.
    pub separation: Vec3,
    /// Laser, attraction or repulsion after weighting and attenuation.
    pub interaction: Vec3,
    /// Wander.
    pub wander: Vec3,
    /// Clamped sum.
    pub total: Vec3,
}

/// Target speed shaped by distance to a destination.
///
/// Zero at or inside `stop`, `nominal` at or beyond `slowdown`, and linear
/// in between.
pub fn shaped_speed(distance: f32, nominal: f32, stop: f32, slowdown: f32) -> f32 {
    if distance <= stop {
        0.0
    } else if distance < slowdown {
        nominal * (distance - stop) / (slowdown - stop)
    } else {
        nominal
    }
}

/// Boids steering state for one cow.
#[derive(Debug, Clone)]
pub struct SteeringAgent {
    id: AgentId,
    config: SteeringConfig,
    velocity: Vec3,
    current_max_speed: f32,
    wander_target: Vec2,
    avoiding_obstacle: bool,
    avoiding_cliff: bool,
    player_in_range: bool,
    laser_target: Option<Vec3>,
    rng: SmallRng,
}

impl SteeringAgent {
    /// Create steering for the body `id`, seeding its wander jitter.
    pub fn new(id: AgentId, config: SteeringConfig, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let heading = rng.random_range(0.0..std::f32::consts::TAU);
        let wander_target = Vec2::from_angle(heading) * config.wander_radius;
        Self {
            id,
            current_max_speed: config.wander_speed,
            config,
            velocity: Vec3::ZERO,
            wander_target,
            avoiding_obstacle: false,
            avoiding_cliff: false,
            player_in_range: false,
            laser_target: None,
            rng,
        }
    }

    /// The body this agent steers.
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Steering parameters.
    pub const fn config(&self) -> &SteeringConfig {
        &self.config
    }

    /// Intended velocity after the last tick.
    pub const fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Target speed chosen on the last tick.
    pub const fn current_max_speed(&self) -> f32 {
        self.current_max_speed
    }

    /// Whether wall avoidance fired on the last tick.
    pub const fn is_avoiding_obstacle(&self) -> bool {
        self.avoiding_obstacle
    }

    /// Whether cliff avoidance fired on the last tick.
    pub const fn is_avoiding_cliff(&self) -> bool {
        self.avoiding_cliff
    }

    /// Whether the shepherd was within detection range on the last tick.
    pub const fn is_player_in_range(&self) -> bool {
        self.player_in_range
    }

    /// Laser point the cow followed on the last tick.
    pub const fn laser_target(&self) -> Option<Vec3> {
        self.laser_target
    }

    /// Drop any carried-over velocity, e.g. after a forced flight.
    pub const fn reset_motion(&mut self) {
        self.velocity = Vec3::ZERO;
    }

    /// Run one steering step.
    ///
    /// Returns `None` without side effects when the body no longer exists.
    pub fn tick<W>(
        &mut self,
        dt: f32,
        world: &mut W,
        view: Option<&InteractionView>,
        flags: InteractionFlags,
    ) -> Option<SteeringForces>
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        let pose = world.pose(self.id)?;

        self.update_detection(pose.position, view);
        self.update_speed(dt, pose.position, view, flags, world);

        let forces = self.compute_forces(&pose, view, flags, &*world);
        self.velocity = (self.velocity + forces.total * dt).clamp_length_max(self.current_max_speed);

        if self.velocity.length_squared() > MIN_MOVE_SPEED_SQ {
            world.add_movement_input(self.id, self.velocity.normalize());
            let facing = yaw_rotation(self.velocity);
            let rotation =
                interp_rotation_to(pose.rotation, facing, dt, self.config.rotation_interp_speed);
            world.set_rotation(self.id, rotation);
        }

        Some(forces)
    }

    fn update_detection(&mut self, position: Vec3, view: Option<&InteractionView>) {
        self.player_in_range = view.is_some_and(|v| {
            v.mode.influences_by_presence()
                && position.distance(v.position) <= self.config.player_detection_radius
        });
        self.laser_target = view.and_then(|v| {
            v.laser_target
                .filter(|point| position.distance(*point) <= v.laser_attraction_radius)
        });
    }

    fn update_speed<W>(
        &mut self,
        dt: f32,
        position: Vec3,
        view: Option<&InteractionView>,
        flags: InteractionFlags,
        world: &mut W,
    ) where
        W: MotionSubstrate + ?Sized,
    {
        let target = self.target_speed(position, view, flags);
        self.current_max_speed = target;

        let applied = if self.config.smooth_speed_transitions {
            let current = world.max_walk_speed(self.id).unwrap_or(target);
            interp_to(current, target, dt, self.config.speed_transition_rate)
        } else {
            target
        };
        world.set_max_walk_speed(self.id, applied);
    }

    fn target_speed(
        &self,
        position: Vec3,
        view: Option<&InteractionView>,
        flags: InteractionFlags,
    ) -> f32 {
        let cfg = &self.config;
        if let Some(point) = self.laser_target {
            return shaped_speed(
                position.distance(point),
                cfg.laser_attraction_speed,
                cfg.laser_stop_distance,
                cfg.laser_slowdown_distance,
            );
        }
        match view {
            Some(v) if self.player_in_range => match flags.state() {
                AttractionState::Repulsed => cfg.repulsion_speed,
                AttractionState::Attracted => shaped_speed(
                    position.distance(v.position),
                    cfg.attraction_speed,
                    cfg.attraction_stop_distance,
                    cfg.attraction_slowdown_distance,
                ),
                AttractionState::None => cfg.wander_speed,
            },
            _ => cfg.wander_speed,
        }
    }

    fn compute_forces<Q>(
        &mut self,
        pose: &Pose,
        view: Option<&InteractionView>,
        flags: InteractionFlags,
        world: &Q,
    ) -> SteeringForces
    where
        Q: SpatialQuery + ?Sized,
    {
        let cfg = &self.config;
        let obstacle = self.obstacle_avoidance(pose, world);
        let cliff = self.cliff_avoidance(pose, world);
        self.avoiding_obstacle = obstacle != Vec3::ZERO;
        self.avoiding_cliff = cliff != Vec3::ZERO;
        let avoiding = self.avoiding_obstacle || self.avoiding_cliff;

        let safety = if avoiding {
            cfg.obstacle_avoidance_weight * cfg.safety_priority_multiplier
        } else {
            cfg.obstacle_avoidance_weight
        };
        let influence = if avoiding {
            cfg.avoidance_interaction_scale
        } else {
            1.0
        };

        let mut forces = SteeringForces {
            obstacle: obstacle * safety,
            cliff: cliff * safety,
            separation: self.separation(pose, world) * cfg.separation_weight,
            interaction: self.interaction(pose.position, view, flags) * influence,
            ..SteeringForces::default()
        };

        let engaged = self.player_in_range && flags.state() != AttractionState::None;
        if !avoiding && self.laser_target.is_none() && !engaged {
            forces.wander = self.wander(pose);
        }

        forces.total = (forces.obstacle
            + forces.cliff
            + forces.separation
            + forces.interaction
            + forces.wander)
            .clamp_length_max(self.config.max_steer_force);
        forces
    }

    fn interaction(
        &self,
        position: Vec3,
        view: Option<&InteractionView>,
        flags: InteractionFlags,
    ) -> Vec3 {
        let cfg = &self.config;
        if let Some(point) = self.laser_target {
            return self.arrive(
                position,
                point,
                cfg.laser_attraction_speed,
                cfg.laser_stop_distance,
                cfg.laser_slowdown_distance,
            ) * cfg.laser_attraction_weight;
        }
        let Some(v) = view.filter(|_| self.player_in_range) else {
            return Vec3::ZERO;
        };
        match flags.state() {
            AttractionState::Repulsed => self.flee(position, v.position) * cfg.repulsion_weight,
            AttractionState::Attracted
                if position.distance(v.position) > cfg.attraction_stop_distance =>
            {
                self.arrive(
                    position,
                    v.position,
                    cfg.attraction_speed,
                    cfg.attraction_stop_distance,
                    cfg.attraction_slowdown_distance,
                ) * cfg.attraction_weight
            }
            _ => Vec3::ZERO,
        }
    }

    /// Seek `target` on the ground plane, slowing inside `slowdown` and
    /// braking inside `stop`.
    fn arrive(&self, position: Vec3, target: Vec3, speed: f32, stop: f32, slowdown: f32) -> Vec3 {
        let to_target = flatten(target - position);
        let distance = to_target.length();
        if distance <= stop {
            return -self.velocity * BRAKE_FACTOR;
        }
        let desired = to_target / distance * shaped_speed(distance, speed, stop, slowdown);
        desired - self.velocity
    }

    fn flee(&self, position: Vec3, threat: Vec3) -> Vec3 {
        let away = flatten(position - threat).normalize_or_zero();
        away * self.config.repulsion_speed - self.velocity
    }

    fn separation<Q>(&self, pose: &Pose, world: &Q) -> Vec3
    where
        Q: SpatialQuery + ?Sized,
    {
        let radius = self.config.separation_radius;
        let mut push = Vec3::ZERO;
        let mut count = 0.0_f32;

        for peer in world.overlap_sphere(pose.position, self.config.perception_radius, Some(AgentKind::Cow)) {
            if peer == self.id {
                continue;
            }
            let Some(peer_pose) = world.pose(peer) else {
                continue;
            };
            let offset = pose.position - peer_pose.position;
            let distance = offset.length();
            if distance > 0.0 && distance < radius {
                push += offset / distance * ((radius - distance) / radius);
                count += 1.0;
            }
        }

        if count < 1.0 {
            return Vec3::ZERO;
        }
        (push / count).normalize_or_zero() * self.current_max_speed - self.velocity
    }

    fn heading(&self, pose: &Pose) -> Vec3 {
        flatten(self.velocity)
            .try_normalize()
            .unwrap_or_else(|| flatten(pose.forward()).normalize_or_zero())
    }

    fn obstacle_avoidance<Q>(&self, pose: &Pose, world: &Q) -> Vec3
    where
        Q: SpatialQuery + ?Sized,
    {
        let cfg = &self.config;
        let reach = cfg.wall_avoidance_distance;
        if reach <= 0.0 {
            return Vec3::ZERO;
        }
        let forward = self.heading(pose);
        let right = pose.right();
        let origin = pose.position + Vec3::Z * cfg.feeler_height;
        let feelers = [
            forward,
            (forward + right * cfg.feeler_spread).normalize_or_zero(),
            (forward - right * cfg.feeler_spread).normalize_or_zero(),
        ];

        let Some(hit) = feelers
            .iter()
            .filter_map(|dir| world.raycast(origin, *dir, reach, QueryChannel::WorldStatic, Some(self.id)))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
        else {
            return Vec3::ZERO;
        };

        let mut tangent = hit.normal.cross(Vec3::Z).normalize_or_zero();
        if tangent.dot(self.velocity) < 0.0 {
            tangent = -tangent;
        }
        let proximity = 1.0 - hit.distance / reach;
        let direction = (hit.normal * proximity + tangent * (1.0 - proximity)).normalize_or_zero();
        direction * self.current_max_speed * proximity - self.velocity
    }

    fn cliff_avoidance<Q>(&self, pose: &Pose, world: &Q) -> Vec3
    where
        Q: SpatialQuery + ?Sized,
    {
        let distance = self.config.cliff_avoidance_distance;
        if distance <= 0.0 {
            return Vec3::ZERO;
        }
        let forward = self.heading(pose);
        if self.ground_ahead(pose.position, forward, distance, world) {
            return Vec3::ZERO;
        }

        let right = forward.cross(Vec3::Z).normalize_or_zero();
        let half = distance * 0.5;
        let right_clear = self.ground_ahead(pose.position, right, half, world);
        let left_clear = self.ground_ahead(pose.position, -right, half, world);
        let escape = match (right_clear, left_clear) {
            (true, false) => right,
            (false, true) => -right,
            _ => -forward,
        };
        escape.normalize_or_zero() * self.current_max_speed - self.velocity
    }

    fn ground_ahead<Q>(&self, position: Vec3, direction: Vec3, distance: f32, world: &Q) -> bool
    where
        Q: SpatialQuery + ?Sized,
    {
        let probe = position + direction * distance + Vec3::Z * GROUND_PROBE_RISE;
        world
            .raycast(probe, Vec3::NEG_Z, GROUND_PROBE_LENGTH, QueryChannel::WorldStatic, Some(self.id))
            .is_some()
    }

    fn wander(&mut self, pose: &Pose) -> Vec3 {
        let cfg = &self.config;
        let jitter = Vec2::new(
            self.rng.random_range(-1.0..=1.0),
            self.rng.random_range(-1.0..=1.0),
        ) * cfg.wander_jitter;
        self.wander_target =
            (self.wander_target + jitter).try_normalize().unwrap_or(Vec2::X) * cfg.wander_radius;

        let local = Vec3::new(
            self.wander_target.x + cfg.wander_distance,
            self.wander_target.y,
            0.0,
        );
        let desired = flatten(pose.local_to_world(local) - pose.position).normalize_or_zero()
            * cfg.wander_speed;
        desired - self.velocity
    }
}
