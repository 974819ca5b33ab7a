//! Picking up, carrying, and throwing cows.
//!
//! While carried a cow has collision off, movement frozen, and a
//! [`SuspensionReason::Carried`] on its steering. Every exit path (drop,
//! throw, death) undoes exactly what pickup did. A throw swaps the carried
//! suspension for [`SuspensionReason::Thrown`], lifted after a grace delay
//! so the cow does not immediately steer out of its arc.

use glam::Vec3;
use herding_types::{AgentId, HerdEvent, SuspensionReason};
use herding_world::geometry::{flatten, interp_rotation_to, interp_vec_to, lerp, yaw_rotation};
use herding_world::{EventBus, MotionSubstrate, SpatialQuery};
use tracing::{debug, info};

use super::InteractionController;
use crate::herd::Herd;

/// Carry and throw-charge state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CarryState {
    carried: Option<AgentId>,
    charging: bool,
    charge_time: f32,
}

impl CarryState {
    /// The cow being carried.
    pub const fn carried(&self) -> Option<AgentId> {
        self.carried
    }

    /// Whether a cow is being carried.
    pub const fn is_carrying(&self) -> bool {
        self.carried.is_some()
    }

    /// Whether a throw is charging.
    pub const fn is_charging(&self) -> bool {
        self.charging
    }

    /// Seconds of charge accumulated.
    pub const fn charge_time(&self) -> f32 {
        self.charge_time
    }

    /// Charge fraction given the time needed for full charge.
    pub fn power(&self, max_charge_time: f32) -> f32 {
        if max_charge_time <= 0.0 {
            return 1.0;
        }
        (self.charge_time / max_charge_time).clamp(0.0, 1.0)
    }

    pub(crate) fn add_charge(&mut self, dt: f32, max_charge_time: f32) {
        self.charge_time = (self.charge_time + dt).min(max_charge_time.max(0.0));
    }

    fn release(&mut self) -> Option<AgentId> {
        self.charging = false;
        self.charge_time = 0.0;
        self.carried.take()
    }
}

impl InteractionController {
    /// Current throw power in `[0, 1]`.
    pub fn throw_power(&self) -> f32 {
        self.carry.power(self.config.max_charge_time)
    }

    /// Pick up the best cow in front of the shepherd, or drop the carried one.
    ///
    /// The best cow is the nearest live one within `pickup_range` whose
    /// horizontal bearing lies inside the pickup cone. Returns whether a cow
    /// is carried afterwards.
    pub fn try_pickup<W>(&mut self, herd: &mut Herd, world: &mut W, events: &mut EventBus) -> bool
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        if self.carry.is_carrying() {
            self.drop_carried(herd, world, events);
            return false;
        }
        let Some(agent) = self.find_pickup_target(herd, &*world) else {
            debug!("No cow within pickup reach");
            return false;
        };
        self.pick_up(agent, herd, world, events);
        true
    }

    fn find_pickup_target<Q>(&self, herd: &Herd, world: &Q) -> Option<AgentId>
    where
        Q: SpatialQuery + ?Sized,
    {
        let shepherd = world.pose(self.id)?;
        let forward = flatten(shepherd.forward()).normalize_or_zero();
        let min_alignment = (self.config.pickup_angle * 0.5).to_radians().cos();

        herd.iter()
            .filter_map(|cow| {
                let pose = world.pose(cow.id())?;
                let distance = pose.position.distance(shepherd.position);
                if distance > self.config.pickup_range {
                    return None;
                }
                let bearing = flatten(pose.position - shepherd.position);
                let aligned = bearing
                    .try_normalize()
                    .is_none_or(|dir| dir.dot(forward) >= min_alignment);
                aligned.then_some((cow.id(), distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    fn pick_up<M>(&mut self, agent: AgentId, herd: &mut Herd, world: &mut M, events: &mut EventBus)
    where
        M: MotionSubstrate + ?Sized,
    {
        self.cancel_resume(agent, herd);
        world.set_collision_enabled(agent, false);
        world.set_movement_suspended(agent, true);
        herd.suspend(agent, SuspensionReason::Carried);
        herd.clear_flags(agent);
        self.nearby.remove(&agent);
        self.carry = CarryState {
            carried: Some(agent),
            charging: false,
            charge_time: 0.0,
        };
        info!(agent = %agent, "Cow picked up");
        events.publish(HerdEvent::CowPickedUp { agent });
    }

    /// Set the carried cow down where it is.
    pub fn drop_carried<M>(&mut self, herd: &mut Herd, world: &mut M, events: &mut EventBus) -> bool
    where
        M: MotionSubstrate + ?Sized,
    {
        let Some(agent) = self.carry.release() else {
            return false;
        };
        world.set_collision_enabled(agent, true);
        world.set_movement_suspended(agent, false);
        world.set_velocity(agent, Vec3::ZERO);
        herd.resume(agent, SuspensionReason::Carried);
        info!(agent = %agent, "Cow dropped");
        events.publish(HerdEvent::CowDropped { agent });
        true
    }

    /// Begin charging a throw. Only valid while carrying.
    pub fn start_charge(&mut self) -> bool {
        if !self.carry.is_carrying() || self.carry.charging {
            return false;
        }
        self.carry.charging = true;
        self.carry.charge_time = 0.0;
        true
    }

    /// Abandon a charging throw, keeping the cow.
    pub fn cancel_charge(&mut self) -> bool {
        if !self.carry.charging {
            return false;
        }
        self.carry.charging = false;
        self.carry.charge_time = 0.0;
        true
    }

    /// Throw the carried cow with the accumulated charge.
    ///
    /// The direction is the horizontal facing (or camera aim) pitched up by
    /// `throw_pitch_degrees`; the speed interpolates between the minimum and
    /// maximum throw speeds by throw power. Returns the launch velocity, or
    /// `None` when no throw was charging.
    pub fn release_throw<W>(&mut self, herd: &mut Herd, world: &mut W, events: &mut EventBus) -> Option<Vec3>
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        if !self.carry.charging || !self.carry.is_carrying() {
            return None;
        }
        let power = self.throw_power();
        let shepherd = world.pose(self.id)?;
        let agent = self.carry.release()?;

        let facing = if self.config.camera_relative_throw {
            self.aim
        } else {
            shepherd.forward()
        };
        let horizontal = flatten(facing).try_normalize().unwrap_or(Vec3::X);
        let pitch = self.config.throw_pitch_degrees.to_radians();
        let direction = horizontal * pitch.cos() + Vec3::Z * pitch.sin();
        let speed = lerp(self.config.min_throw_speed, self.config.max_throw_speed, power);
        let velocity = direction * speed;

        world.set_collision_enabled(agent, true);
        world.set_movement_suspended(agent, false);
        world.set_falling_mode(agent);
        world.set_velocity(agent, velocity);
        herd.suspend(agent, SuspensionReason::Thrown);
        herd.resume(agent, SuspensionReason::Carried);
        self.schedule_resume(agent, herd);

        info!(agent = %agent, power, speed, "Cow thrown");
        events.publish(HerdEvent::CowThrown {
            agent,
            velocity,
            power,
        });
        Some(velocity)
    }

    /// Move the carried cow toward the carry point, or release it silently
    /// if it no longer exists.
    pub(crate) fn follow_carried<W>(&mut self, dt: f32, herd: &mut Herd, world: &mut W, events: &mut EventBus)
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        let Some(agent) = self.carry.carried() else {
            return;
        };
        let (Some(cow), true) = (world.pose(agent), herd.contains(agent)) else {
            debug!(agent = %agent, "Carried cow no longer exists");
            self.carry.release();
            return;
        };
        let Some(shepherd) = world.pose(self.id) else {
            self.drop_carried(herd, world, events);
            return;
        };

        let flat_forward = flatten(shepherd.forward()).try_normalize().unwrap_or(Vec3::X);
        let forward = if self.config.camera_relative_carry {
            let aim_flat = flatten(self.aim).try_normalize().unwrap_or(flat_forward);
            let pitch = self.aim.z.clamp(-1.0, 1.0).asin() * self.config.carry_pitch_damping;
            aim_flat * pitch.cos() + Vec3::Z * pitch.sin()
        } else {
            flat_forward
        };
        let right = flatten(forward).try_normalize().unwrap_or(flat_forward).cross(Vec3::Z);
        let offset = self.config.carry_offset;
        let target = shepherd.position + forward * offset.x + right * offset.y + Vec3::Z * offset.z;

        let speed = self.config.carry_interp_speed;
        world.set_position(agent, interp_vec_to(cow.position, target, dt, speed));
        world.set_rotation(
            agent,
            interp_rotation_to(cow.rotation, yaw_rotation(flat_forward), dt, speed),
        );
    }
}
