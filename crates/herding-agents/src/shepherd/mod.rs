//! The shepherd: the single controllable agent that influences the herd.
//!
//! [`InteractionController`] owns the shepherd's interaction mode and the
//! set of cows it is currently influencing. It is the only writer of cow
//! [`InteractionFlags`](crate::flags::InteractionFlags). Steering reads
//! its state through the [`InteractionView`] snapshot built once per tick.
//!
//! Carrying and throwing live in [`carry`]; the laser pointer in [`laser`].

pub mod carry;
pub mod laser;

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec3;
use herding_types::{AgentId, HerdEvent, ShepherdMode, SuspensionReason};
use herding_world::{EventBus, MotionSubstrate, SpatialQuery, TimerHandle, TimerService};
use tracing::{debug, info};

use crate::config::ShepherdConfig;
use crate::herd::Herd;
use crate::steering::InteractionView;

pub use carry::CarryState;
pub use laser::LaserState;

/// Controller state for the shepherd body.
#[derive(Debug, Clone)]
pub struct InteractionController {
    id: AgentId,
    config: ShepherdConfig,
    mode: ShepherdMode,
    nearby: BTreeSet<AgentId>,
    rescan_elapsed: f32,
    aim: Vec3,
    carry: CarryState,
    laser: LaserState,
    resume_timers: TimerService<AgentId>,
    pending_resumes: BTreeMap<AgentId, TimerHandle>,
}

impl InteractionController {
    /// Create a controller for the shepherd body `id`, in neutral mode.
    pub fn new(id: AgentId, config: ShepherdConfig) -> Self {
        Self {
            id,
            config,
            mode: ShepherdMode::Neutral,
            nearby: BTreeSet::new(),
            rescan_elapsed: 0.0,
            aim: Vec3::X,
            carry: CarryState::default(),
            laser: LaserState::default(),
            resume_timers: TimerService::new(),
            pending_resumes: BTreeMap::new(),
        }
    }

    /// The shepherd's body ID.
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Controller parameters.
    pub const fn config(&self) -> &ShepherdConfig {
        &self.config
    }

    /// Current interaction mode.
    pub const fn mode(&self) -> ShepherdMode {
        self.mode
    }

    /// Cows found by the last rescan.
    pub const fn nearby_agents(&self) -> &BTreeSet<AgentId> {
        &self.nearby
    }

    /// Camera aim direction.
    pub const fn aim(&self) -> Vec3 {
        self.aim
    }

    /// Carry and throw state.
    pub const fn carry(&self) -> &CarryState {
        &self.carry
    }

    /// Laser state.
    pub const fn laser(&self) -> &LaserState {
        &self.laser
    }

    /// Whether a thrown cow is still inside its steering grace period.
    pub fn has_pending_resume(&self, agent: AgentId) -> bool {
        self.pending_resumes.contains_key(&agent)
    }

    /// Point the camera. The body turns to face the horizontal aim.
    pub fn set_aim<M>(&mut self, world: &mut M, direction: Vec3)
    where
        M: MotionSubstrate + ?Sized,
    {
        let Some(aim) = direction.try_normalize() else {
            return;
        };
        self.aim = aim;
        world.set_rotation(self.id, herding_world::geometry::yaw_rotation(aim));
    }

    /// Walk the shepherd body along `direction`.
    pub fn move_input<M>(&self, world: &mut M, direction: Vec3)
    where
        M: MotionSubstrate + ?Sized,
    {
        world.set_max_walk_speed(self.id, self.config.walk_speed);
        world.add_movement_input(self.id, direction);
    }

    /// Snapshot of the shepherd for this tick's steering pass.
    ///
    /// `None` when the shepherd body does not exist, which leaves every cow
    /// wandering.
    pub fn view<Q>(&self, world: &Q) -> Option<InteractionView>
    where
        Q: SpatialQuery + ?Sized,
    {
        let pose = world.pose(self.id)?;
        Some(InteractionView {
            mode: self.mode,
            position: pose.position,
            laser_target: self.laser.target(),
            laser_attraction_radius: self.config.laser_attraction_radius,
        })
    }

    /// Switch interaction mode.
    ///
    /// A no-op when `mode` is already current. Otherwise every previously
    /// influenced cow loses its flags, the nearby set is rebuilt at once,
    /// and [`HerdEvent::ModeChanged`] is published. Leaving laser mode this
    /// way also switches the laser off.
    pub fn set_mode<Q>(&mut self, mode: ShepherdMode, herd: &mut Herd, world: &Q, events: &mut EventBus) -> bool
    where
        Q: SpatialQuery + ?Sized,
    {
        if mode == self.mode {
            return false;
        }
        if mode != ShepherdMode::LaserAttraction && self.laser.is_active() {
            self.laser.deactivate();
            events.publish(HerdEvent::LaserToggled { active: false });
        }

        let previous = self.mode;
        self.mode = mode;
        self.rescan(herd, world);
        self.rescan_elapsed = 0.0;

        info!(?previous, current = ?mode, nearby = self.nearby.len(), "Shepherd mode changed");
        events.publish(HerdEvent::ModeChanged {
            previous,
            current: mode,
        });
        true
    }

    /// Flip between attraction and neutral.
    pub fn toggle_attraction<Q>(&mut self, herd: &mut Herd, world: &Q, events: &mut EventBus) -> bool
    where
        Q: SpatialQuery + ?Sized,
    {
        let next = if self.mode == ShepherdMode::Attraction {
            ShepherdMode::Neutral
        } else {
            ShepherdMode::Attraction
        };
        self.set_mode(next, herd, world, events)
    }

    /// Flip between repulsion and neutral.
    pub fn toggle_repulsion<Q>(&mut self, herd: &mut Herd, world: &Q, events: &mut EventBus) -> bool
    where
        Q: SpatialQuery + ?Sized,
    {
        let next = if self.mode == ShepherdMode::Repulsion {
            ShepherdMode::Neutral
        } else {
            ShepherdMode::Repulsion
        };
        self.set_mode(next, herd, world, events)
    }

    /// Return to neutral.
    pub fn set_neutral<Q>(&mut self, herd: &mut Herd, world: &Q, events: &mut EventBus) -> bool
    where
        Q: SpatialQuery + ?Sized,
    {
        self.set_mode(ShepherdMode::Neutral, herd, world, events)
    }

    /// Rebuild the nearby set and reapply flags for the current mode.
    ///
    /// Flags on the previous set are cleared first. The carried cow is never
    /// included. In laser mode the candidates are cows near the laser point,
    /// and nobody qualifies while the laser has no valid hit.
    pub fn rescan<Q>(&mut self, herd: &mut Herd, world: &Q)
    where
        Q: SpatialQuery + ?Sized,
    {
        for agent in std::mem::take(&mut self.nearby) {
            herd.clear_flags(agent);
        }
        let Some(shepherd) = world.pose(self.id) else {
            return;
        };
        let carried = self.carry.carried();
        let radius = self.config.laser_attraction_radius;

        self.nearby = match (self.mode, self.laser.target()) {
            (ShepherdMode::LaserAttraction, None) => BTreeSet::new(),
            (ShepherdMode::LaserAttraction, Some(point)) => herd
                .iter()
                .filter(|cow| Some(cow.id()) != carried)
                .filter(|cow| {
                    world
                        .pose(cow.id())
                        .is_some_and(|p| p.position.distance(point) <= radius)
                })
                .map(crate::herd::Cow::id)
                .collect(),
            _ => herd
                .iter()
                .filter(|cow| Some(cow.id()) != carried)
                .filter(|cow| {
                    world.pose(cow.id()).is_some_and(|p| {
                        p.position.distance(shepherd.position)
                            <= cow.steering().config().player_detection_radius
                    })
                })
                .map(crate::herd::Cow::id)
                .collect(),
        };

        for agent in &self.nearby {
            match self.mode {
                ShepherdMode::Attraction | ShepherdMode::LaserAttraction => {
                    herd.set_attraction(*agent, true);
                }
                ShepherdMode::Repulsion => {
                    herd.set_repulsion(*agent, true);
                }
                ShepherdMode::Neutral => {}
            }
        }
        debug!(mode = ?self.mode, nearby = self.nearby.len(), "Shepherd rescan");
    }

    /// Advance the controller by one tick.
    ///
    /// Lifts expired throw grace periods, traces the laser, follows the
    /// carried cow, accumulates throw charge, and rescans on its interval.
    pub fn tick<W>(&mut self, dt: f32, herd: &mut Herd, world: &mut W, events: &mut EventBus)
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        for fired in self.resume_timers.advance(dt) {
            let agent = fired.payload;
            self.pending_resumes.remove(&agent);
            herd.resume(agent, SuspensionReason::Thrown);
        }

        if self.laser.is_active() {
            self.trace_laser(&*world);
        }

        self.follow_carried(dt, herd, world, events);
        if self.carry.is_charging() {
            self.carry.add_charge(dt, self.config.max_charge_time);
        }

        self.rescan_elapsed += dt;
        if self.rescan_elapsed >= self.config.rescan_interval {
            self.rescan_elapsed = 0.0;
            self.rescan(herd, &*world);
        }
    }

    fn schedule_resume(&mut self, agent: AgentId, herd: &mut Herd) {
        let delay = self.config.throw_steering_resume_delay;
        if delay <= 0.0 {
            herd.resume(agent, SuspensionReason::Thrown);
            return;
        }
        let handle = self.resume_timers.schedule(delay, agent);
        if let Some(stale) = self.pending_resumes.insert(agent, handle) {
            self.resume_timers.cancel(stale);
        }
    }

    fn cancel_resume(&mut self, agent: AgentId, herd: &mut Herd) {
        if let Some(handle) = self.pending_resumes.remove(&agent) {
            self.resume_timers.cancel(handle);
            herd.resume(agent, SuspensionReason::Thrown);
        }
    }
}
