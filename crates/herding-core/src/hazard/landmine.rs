//! Landmine: launches every cow in its blast radius, or kills those
//! standing on it.
//!
//! A freshly placed mine can run an arming sequence first. It sits in
//! `Idle` and beeps at an interval that shortens as arming nears
//! completion, then arms.

use std::collections::BTreeSet;

use glam::Vec3;
use herding_types::{AgentId, AgentKind, HazardKind, HerdEvent, KillCause, SuspensionReason};
use herding_world::geometry::lerp;
use herding_world::{EventBus, MotionSubstrate, SpatialQuery};
use serde::Deserialize;
use tracing::{debug, info};

use super::{TrapBehavior, TrapConfig, TrapContext, TrapCore, TrapTimer};

/// Minimum share of launch speed applied upward, so cows at the edge of the
/// blast still arc.
const MIN_VERTICAL_FACTOR: f32 = 0.3;

/// Landmine parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LandmineConfig {
    /// Shared lifecycle parameters (default: 0.1 s activation, 5 s cooldown).
    #[serde(default = "TrapConfig::landmine")]
    pub trap: TrapConfig,
    /// Cows within this distance are affected (default: 500).
    pub explosion_radius: f32,
    /// Kill cows inside `kill_radius` instead of launching them (default: true).
    pub kill_cows_in_center: bool,
    /// Radius of the instant-kill zone (default: 100).
    pub kill_radius: f32,
    /// Launch speed at the edge of the blast (default: 800).
    pub min_launch_speed: f32,
    /// Launch speed at the center of the blast (default: 1500).
    pub max_launch_speed: f32,
    /// Scale on the upward launch component (default: 1.5).
    pub vertical_launch_multiplier: f32,
    /// Scale on the outward launch component (default: 1).
    pub horizontal_launch_multiplier: f32,
    /// Run the arming sequence on spawn and reset (default: true).
    pub start_armed_after_delay: bool,
    /// Length of the arming sequence in seconds (default: 2).
    pub arming_delay: f32,
    /// Beep interval at the start of arming (default: 1).
    pub beep_interval: f32,
    /// Per-tenth-of-progress factor on the beep interval (default: 0.9).
    pub beep_acceleration: f32,
    /// Seconds a launched cow flies before steering again (default: 3).
    pub steering_resume_delay: f32,
    /// Seconds the mine stays active after exploding (default: 0.5).
    pub active_duration: f32,
}

impl Default for LandmineConfig {
    fn default() -> Self {
        Self {
            trap: TrapConfig::landmine(),
            explosion_radius: 500.0,
            kill_cows_in_center: true,
            kill_radius: 100.0,
            min_launch_speed: 800.0,
            max_launch_speed: 1500.0,
            vertical_launch_multiplier: 1.5,
            horizontal_launch_multiplier: 1.0,
            start_armed_after_delay: true,
            arming_delay: 2.0,
            beep_interval: 1.0,
            beep_acceleration: 0.9,
            steering_resume_delay: 3.0,
            active_duration: 0.5,
        }
    }
}

/// Launch speed for a cow `distance` from the blast center.
///
/// Falls off with the square root of the remaining fraction of the radius:
/// maximum at the center, minimum at the edge and beyond.
pub fn launch_speed(distance: f32, config: &LandmineConfig) -> f32 {
    let factor = falloff(distance, config.explosion_radius);
    lerp(config.min_launch_speed, config.max_launch_speed, factor)
}

fn falloff(distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / radius).clamp(0.0, 1.0).sqrt()
}

/// Launch velocity for a cow at `target` from a blast at `center`.
///
/// Outward and upward components are scaled independently. A cow directly
/// on top of the mine goes straight up.
pub fn launch_velocity(center: Vec3, target: Vec3, config: &LandmineConfig) -> Vec3 {
    let offset = target - center;
    let distance = offset.length();
    let (direction, distance) = if distance > 0.0 {
        (offset / distance, distance)
    } else {
        (Vec3::Z, 1.0)
    };
    let factor = falloff(distance, config.explosion_radius);
    let speed = lerp(config.min_launch_speed, config.max_launch_speed, factor);
    let horizontal = Vec3::new(direction.x, direction.y, 0.0).normalize_or_zero();

    let mut velocity = horizontal * speed * config.horizontal_launch_multiplier;
    velocity.z = speed * factor.max(MIN_VERTICAL_FACTOR) * config.vertical_launch_multiplier;
    velocity
}

/// Landmine payload.
#[derive(Debug, Clone)]
pub struct Landmine {
    config: LandmineConfig,
    arming: bool,
    arming_elapsed: f32,
    since_last_beep: f32,
    beep_interval: f32,
    exploded: bool,
    processed: BTreeSet<AgentId>,
}

impl Landmine {
    pub(crate) fn new(config: LandmineConfig) -> Self {
        let beep_interval = config.beep_interval;
        Self {
            config,
            arming: false,
            arming_elapsed: 0.0,
            since_last_beep: 0.0,
            beep_interval,
            exploded: false,
            processed: BTreeSet::new(),
        }
    }

    /// Landmine parameters.
    pub const fn config(&self) -> &LandmineConfig {
        &self.config
    }

    /// Whether the arming sequence is running.
    pub const fn is_arming(&self) -> bool {
        self.arming
    }

    /// Current interval between arming beeps.
    pub const fn beep_interval(&self) -> f32 {
        self.beep_interval
    }

    /// Whether the mine has exploded during the current activation.
    pub const fn has_exploded(&self) -> bool {
        self.exploded
    }

    fn beep(&self, core: &TrapCore, events: &mut EventBus) {
        events.publish(HerdEvent::MineArmingBeep {
            trap: core.id(),
            interval: self.beep_interval,
        });
    }

    fn explode<W>(&mut self, core: &TrapCore, ctx: &mut TrapContext<'_, W>) -> Vec<AgentId>
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        if self.exploded {
            return Vec::new();
        }
        self.exploded = true;
        let center = core.position();
        let mut launched = Vec::new();

        let caught = ctx
            .world
            .overlap_sphere(center, self.config.explosion_radius, Some(AgentKind::Cow));
        for agent in caught {
            if !self.processed.insert(agent) || !ctx.herd.contains(agent) {
                continue;
            }
            let Some(pose) = ctx.world.pose(agent) else {
                continue;
            };
            let distance = pose.position.distance(center);

            if self.config.kill_cows_in_center && distance <= self.config.kill_radius {
                if ctx.herd.kill(agent, ctx.world) {
                    ctx.events.publish(HerdEvent::CowKilled {
                        agent,
                        cause: KillCause::Explosion,
                    });
                }
                continue;
            }

            let velocity = launch_velocity(center, pose.position, &self.config);
            ctx.herd.suspend(agent, SuspensionReason::Launched);
            ctx.world.set_falling_mode(agent);
            ctx.world.set_velocity(agent, velocity);
            debug!(agent = %agent, speed = velocity.length(), "Cow launched");
            ctx.events.publish(HerdEvent::CowLaunched {
                trap: core.id(),
                agent,
                velocity,
            });
            launched.push(agent);
        }

        info!(trap = %core.id(), launched = launched.len(), "Landmine exploded");
        ctx.events.publish(HerdEvent::MineExploded {
            trap: core.id(),
            position: center,
        });
        launched
    }
}

impl TrapBehavior for Landmine {
    fn hazard_kind(&self) -> HazardKind {
        HazardKind::Landmine
    }

    fn on_activate<W>(&mut self, core: &mut TrapCore, ctx: &mut TrapContext<'_, W>) -> f32
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        for agent in self.explode(core, ctx) {
            core.schedule_resume(agent, self.config.steering_resume_delay, ctx.herd);
        }
        for agent in core.cows_in_trigger() {
            if !ctx.herd.contains(agent) {
                core.forget(agent);
            }
        }
        self.config.active_duration
    }

    fn on_deactivate<W>(&mut self, _core: &mut TrapCore, _ctx: &mut TrapContext<'_, W>)
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        self.exploded = false;
        self.processed.clear();
    }

    fn on_interrupt(&mut self) {
        self.arming = false;
        self.arming_elapsed = 0.0;
    }

    fn on_reset(&mut self, core: &mut TrapCore, events: &mut EventBus) -> bool {
        if !self.config.start_armed_after_delay || self.config.arming_delay <= 0.0 {
            return false;
        }
        self.arming = true;
        self.arming_elapsed = 0.0;
        self.since_last_beep = 0.0;
        self.beep_interval = self.config.beep_interval;
        self.beep(core, events);
        core.arming = Some(
            core.timers
                .schedule(self.config.arming_delay, TrapTimer::ArmingComplete),
        );
        debug!(trap = %core.id(), delay = self.config.arming_delay, "Landmine arming");
        true
    }

    fn on_tick<W>(&mut self, dt: f32, core: &mut TrapCore, ctx: &mut TrapContext<'_, W>)
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        if !self.arming {
            return;
        }
        self.arming_elapsed += dt;
        self.since_last_beep += dt;
        let progress = self.arming_elapsed / self.config.arming_delay;
        self.beep_interval = self.config.beep_interval * self.config.beep_acceleration.powf(progress * 10.0);
        if self.since_last_beep >= self.beep_interval {
            self.since_last_beep = 0.0;
            self.beep(core, ctx.events);
        }
    }
}
