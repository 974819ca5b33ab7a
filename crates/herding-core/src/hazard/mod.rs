//! Environmental traps.
//!
//! Every trap shares one lifecycle, driven by [`TrapCore`]:
//!
//! ```text
//! Idle -> Armed -> Triggered -> Active -> Cooldown -> Armed ...
//!   \________\__________\__________\_________\_____-> Disabled
//! ```
//!
//! Only an armed trap accepts a trigger. `Triggered -> Active` and
//! `Active -> Cooldown | Disabled` happen only when the trap's own timers
//! fire, never in response to overlaps, so dwell times are deterministic.
//! A request for any transition outside that table is ignored.
//!
//! What a trap *does* lives in its [`TrapKind`] payload: a [`Landmine`]
//! launches or kills every cow in its blast radius; a [`SpikeTrap`] impales
//! the cows standing on it.

pub mod landmine;
pub mod spike;

use std::collections::BTreeMap;

use glam::Vec3;
use herding_agents::Herd;
use herding_types::{AgentId, AgentKind, HazardKind, HerdEvent, SuspensionReason, TrapId, TrapState};
use herding_world::{
    Aabb, EventBus, MotionSubstrate, OverlapEvent, OverlapWatcher, SpatialQuery, TimerHandle,
    TimerService,
};
use serde::Deserialize;
use tracing::{debug, info};

pub use landmine::{Landmine, LandmineConfig, launch_speed, launch_velocity};
pub use spike::{SpikeConfig, SpikeTrap};

/// Lifecycle parameters shared by every trap.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrapConfig {
    /// Arm on spawn and reset; otherwise start disabled (default: true).
    pub start_armed: bool,
    /// Disable permanently after the first activation (default: false).
    pub single_use: bool,
    /// Seconds between deactivation and re-arming (default: 3).
    pub cooldown_duration: f32,
    /// Seconds between trigger and activation (default: 0.5).
    pub activation_delay: f32,
    /// Cows set the trap off (default: true).
    pub require_cow_to_trigger: bool,
    /// The shepherd sets the trap off (default: false).
    pub can_trigger_on_player: bool,
    /// Half extents of the trigger box around the trap (default: [100, 100, 50]).
    pub trigger_half_extent: Vec3,
}

impl Default for TrapConfig {
    fn default() -> Self {
        Self {
            start_armed: true,
            single_use: false,
            cooldown_duration: 3.0,
            activation_delay: 0.5,
            require_cow_to_trigger: true,
            can_trigger_on_player: false,
            trigger_half_extent: Vec3::new(100.0, 100.0, 50.0),
        }
    }
}

impl TrapConfig {
    /// Lifecycle defaults for a landmine: near-instant detonation and a
    /// longer cooldown over a small pressure plate.
    pub fn landmine() -> Self {
        Self {
            activation_delay: 0.1,
            cooldown_duration: 5.0,
            trigger_half_extent: Vec3::new(50.0, 50.0, 20.0),
            ..Self::default()
        }
    }

    /// Lifecycle defaults for a spike trap.
    pub fn spike() -> Self {
        Self {
            activation_delay: 1.0,
            cooldown_duration: 3.0,
            ..Self::default()
        }
    }

    fn accepts(&self, kind: AgentKind) -> bool {
        match kind {
            AgentKind::Cow => self.require_cow_to_trigger,
            AgentKind::Shepherd => self.can_trigger_on_player,
        }
    }
}

/// Payload of a trap timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapTimer {
    /// Triggered -> Active.
    Activate,
    /// Active -> Cooldown or Disabled.
    Deactivate,
    /// Cooldown -> Armed.
    Cooldown,
    /// Landmine arming sequence finished.
    ArmingComplete,
    /// Give a launched cow its steering back.
    ResumeSteering(AgentId),
}

/// Mutable handles a trap needs while it runs.
pub struct TrapContext<'a, W: ?Sized> {
    /// The world substrate.
    pub world: &'a mut W,
    /// The live herd.
    pub herd: &'a mut Herd,
    /// Notification channel.
    pub events: &'a mut EventBus,
}

/// Lifecycle state shared by every trap kind.
#[derive(Debug, Clone)]
pub struct TrapCore {
    id: TrapId,
    config: TrapConfig,
    position: Vec3,
    state: TrapState,
    time_in_state: f32,
    volume: OverlapWatcher,
    actors_in_trigger: BTreeMap<AgentId, AgentKind>,
    last_triggering_agent: Option<AgentId>,
    timers: TimerService<TrapTimer>,
    activation: Option<TimerHandle>,
    deactivation: Option<TimerHandle>,
    cooldown: Option<TimerHandle>,
    arming: Option<TimerHandle>,
}

impl TrapCore {
    fn new(config: TrapConfig, position: Vec3) -> Self {
        let volume = OverlapWatcher::new(
            Aabb::from_center(position, config.trigger_half_extent),
            None,
        );
        Self {
            id: TrapId::new(),
            config,
            position,
            state: TrapState::Idle,
            time_in_state: 0.0,
            volume,
            actors_in_trigger: BTreeMap::new(),
            last_triggering_agent: None,
            timers: TimerService::new(),
            activation: None,
            deactivation: None,
            cooldown: None,
            arming: None,
        }
    }

    /// Trap ID.
    pub const fn id(&self) -> TrapId {
        self.id
    }

    /// Lifecycle parameters.
    pub const fn config(&self) -> &TrapConfig {
        &self.config
    }

    /// World position of the trap.
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> TrapState {
        self.state
    }

    /// Seconds spent in the current state.
    pub const fn time_in_state(&self) -> f32 {
        self.time_in_state
    }

    /// The trigger box.
    pub const fn trigger_bounds(&self) -> &Aabb {
        self.volume.bounds()
    }

    /// Qualifying bodies currently inside the trigger box.
    pub const fn actors_in_trigger(&self) -> &BTreeMap<AgentId, AgentKind> {
        &self.actors_in_trigger
    }

    /// The body that most recently set the trap off.
    pub const fn last_triggering_agent(&self) -> Option<AgentId> {
        self.last_triggering_agent
    }

    /// Seconds until the pending activation, if one is scheduled.
    pub fn activation_remaining(&self) -> Option<f32> {
        self.activation.and_then(|h| self.timers.remaining(h))
    }

    /// Seconds until re-arming, if cooling down.
    pub fn cooldown_remaining(&self) -> Option<f32> {
        self.cooldown.and_then(|h| self.timers.remaining(h))
    }

    /// Number of launched cows still waiting for their steering back.
    pub fn pending_resumes(&self) -> usize {
        self.timers
            .count_where(|t| matches!(t, TrapTimer::ResumeSteering(_)))
    }

    fn transition(&mut self, next: TrapState) -> bool {
        if !self.state.can_transition_to(next) {
            debug!(trap = %self.id, from = ?self.state, to = ?next, "Trap transition rejected");
            return false;
        }
        debug!(trap = %self.id, from = ?self.state, to = ?next, "Trap transition");
        self.state = next;
        self.time_in_state = 0.0;
        true
    }

    /// Cancel lifecycle timers. Steering-resume timers are left running so
    /// every launched cow gets its steering back.
    fn cancel_lifecycle_timers(&mut self) {
        for handle in [
            self.activation.take(),
            self.deactivation.take(),
            self.cooldown.take(),
            self.arming.take(),
        ]
        .into_iter()
        .flatten()
        {
            self.timers.cancel(handle);
        }
    }

    pub(crate) fn schedule_resume(&mut self, agent: AgentId, delay: f32, herd: &mut Herd) {
        if delay <= 0.0 {
            herd.resume(agent, SuspensionReason::Launched);
            return;
        }
        self.timers.schedule(delay, TrapTimer::ResumeSteering(agent));
    }

    pub(crate) fn cows_in_trigger(&self) -> Vec<AgentId> {
        self.actors_in_trigger
            .iter()
            .filter(|(_, kind)| **kind == AgentKind::Cow)
            .map(|(agent, _)| *agent)
            .collect()
    }

    pub(crate) fn forget(&mut self, agent: AgentId) {
        self.actors_in_trigger.remove(&agent);
    }
}

/// Kind-specific trap payload.
#[derive(Debug, Clone)]
pub enum TrapKind {
    /// Explosive that launches or kills cows in its blast radius.
    Landmine(Landmine),
    /// Spikes that impale the cows standing on the plate.
    Spike(SpikeTrap),
}

/// Per-kind lifecycle hooks.
///
/// [`Trap`] runs the shared lifecycle and calls these at each step.
pub trait TrapBehavior {
    /// Which kind of hazard this is.
    fn hazard_kind(&self) -> HazardKind;

    /// Delay from trigger to activation given the configured base delay.
    fn activation_delay(&self, base: f32) -> f32 {
        base
    }

    /// The trap was just triggered.
    fn on_trigger<W>(&mut self, _core: &mut TrapCore, _ctx: &mut TrapContext<'_, W>)
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
    }

    /// The trap just became active. Returns how long it stays active.
    fn on_activate<W>(&mut self, core: &mut TrapCore, ctx: &mut TrapContext<'_, W>) -> f32
    where
        W: SpatialQuery + MotionSubstrate + ?Sized;

    /// The trap is leaving the active state.
    fn on_deactivate<W>(&mut self, _core: &mut TrapCore, _ctx: &mut TrapContext<'_, W>)
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
    }

    /// Any pre-arming or warning sub-phase must stop.
    fn on_interrupt(&mut self) {}

    /// The trap is being reset. Returns `true` if the kind takes over
    /// arming itself.
    fn on_reset(&mut self, _core: &mut TrapCore, _events: &mut EventBus) -> bool {
        false
    }

    /// Per-tick update, after overlaps and before timers.
    fn on_tick<W>(&mut self, _dt: f32, _core: &mut TrapCore, _ctx: &mut TrapContext<'_, W>)
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
    }
}

macro_rules! dispatch {
    ($kind:expr, $trap:ident => $body:expr) => {
        match $kind {
            TrapKind::Landmine($trap) => $body,
            TrapKind::Spike($trap) => $body,
        }
    };
}

/// A trap: shared lifecycle plus kind-specific payload.
#[derive(Debug, Clone)]
pub struct Trap {
    core: TrapCore,
    kind: TrapKind,
}

impl Trap {
    /// Build a landmine at `position`. Call [`Trap::reset`] to bring it
    /// into play.
    pub fn landmine(position: Vec3, config: LandmineConfig) -> Self {
        Self {
            core: TrapCore::new(config.trap.clone(), position),
            kind: TrapKind::Landmine(Landmine::new(config)),
        }
    }

    /// Build a spike trap at `position`. Call [`Trap::reset`] to bring it
    /// into play.
    pub fn spike(position: Vec3, config: SpikeConfig) -> Self {
        Self {
            core: TrapCore::new(config.trap.clone(), position),
            kind: TrapKind::Spike(SpikeTrap::new(config)),
        }
    }

    /// Shared lifecycle state.
    pub const fn core(&self) -> &TrapCore {
        &self.core
    }

    /// Kind-specific payload.
    pub const fn kind(&self) -> &TrapKind {
        &self.kind
    }

    /// Trap ID.
    pub const fn id(&self) -> TrapId {
        self.core.id
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> TrapState {
        self.core.state
    }

    /// Which kind of hazard this is.
    pub fn hazard_kind(&self) -> HazardKind {
        dispatch!(&self.kind, t => t.hazard_kind())
    }

    /// Arm the trap. Only valid from `Idle` or `Cooldown`.
    pub fn arm(&mut self, events: &mut EventBus) -> bool {
        if !matches!(self.core.state, TrapState::Idle | TrapState::Cooldown) {
            debug!(trap = %self.core.id, state = ?self.core.state, "Arm ignored");
            return false;
        }
        dispatch!(&mut self.kind, t => t.on_interrupt());
        for handle in [self.core.cooldown.take(), self.core.arming.take()]
            .into_iter()
            .flatten()
        {
            self.core.timers.cancel(handle);
        }
        if !self.core.transition(TrapState::Armed) {
            return false;
        }
        info!(trap = %self.core.id, kind = ?self.hazard_kind(), "Trap armed");
        events.publish(HerdEvent::TrapArmed { trap: self.core.id });
        true
    }

    /// Take the trap out of play.
    ///
    /// Cancels pending activation, deactivation and cooldown timers. If the
    /// trap is active its kind-specific cleanup runs first. Launched cows
    /// still get their steering back on schedule.
    pub fn disarm<W>(&mut self, ctx: &mut TrapContext<'_, W>) -> bool
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        if self.core.state == TrapState::Disabled {
            return false;
        }
        self.core.cancel_lifecycle_timers();
        dispatch!(&mut self.kind, t => t.on_interrupt());
        if self.core.state == TrapState::Active {
            ctx.events.publish(HerdEvent::TrapDeactivated { trap: self.core.id });
            dispatch!(&mut self.kind, t => t.on_deactivate(&mut self.core, ctx));
        }
        if !self.core.transition(TrapState::Disabled) {
            return false;
        }
        info!(trap = %self.core.id, "Trap disabled");
        ctx.events.publish(HerdEvent::TrapDisabled { trap: self.core.id });
        true
    }

    /// Return the trap to its spawn state.
    ///
    /// Cancels lifecycle timers, forgets who is standing on it, and goes back
    /// to `Idle`. Then it arms (or starts its arming sequence) when
    /// `start_armed` is set, and disables itself otherwise. This is the only
    /// way out of `Disabled`.
    pub fn reset<W>(&mut self, ctx: &mut TrapContext<'_, W>)
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        self.core.cancel_lifecycle_timers();
        dispatch!(&mut self.kind, t => t.on_interrupt());
        if self.core.state == TrapState::Active {
            ctx.events.publish(HerdEvent::TrapDeactivated { trap: self.core.id });
            dispatch!(&mut self.kind, t => t.on_deactivate(&mut self.core, ctx));
        }
        self.core.actors_in_trigger.clear();
        self.core.last_triggering_agent = None;
        self.core.state = TrapState::Idle;
        self.core.time_in_state = 0.0;

        if !self.core.config.start_armed {
            self.disarm(ctx);
            return;
        }
        let deferred = dispatch!(&mut self.kind, t => t.on_reset(&mut self.core, ctx.events));
        if !deferred {
            self.arm(ctx.events);
        }
    }

    /// A body entered the trigger box.
    ///
    /// Bodies the trap does not react to are ignored. Others are tracked
    /// while they stay inside, and set the trap off if it is armed.
    pub fn on_overlap_begin<W>(&mut self, agent: AgentId, kind: AgentKind, ctx: &mut TrapContext<'_, W>)
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        if !self.core.config.accepts(kind) {
            return;
        }
        self.core.actors_in_trigger.insert(agent, kind);
        if self.core.state == TrapState::Armed {
            self.trigger(agent, ctx);
        }
    }

    /// A body left the trigger box.
    pub fn on_overlap_end(&mut self, agent: AgentId) {
        self.core.actors_in_trigger.remove(&agent);
    }

    fn trigger<W>(&mut self, agent: AgentId, ctx: &mut TrapContext<'_, W>)
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        if !self.core.transition(TrapState::Triggered) {
            return;
        }
        self.core.last_triggering_agent = Some(agent);
        let kind = self.hazard_kind();
        info!(trap = %self.core.id, ?kind, agent = %agent, "Trap triggered");
        ctx.events.publish(HerdEvent::TrapTriggered {
            trap: self.core.id,
            kind,
            agent,
        });
        dispatch!(&mut self.kind, t => t.on_trigger(&mut self.core, ctx));

        let base = self.core.config.activation_delay;
        let delay = dispatch!(&self.kind, t => t.activation_delay(base));
        if delay > 0.0 {
            self.core.activation = Some(self.core.timers.schedule(delay, TrapTimer::Activate));
        } else {
            self.activate(ctx);
        }
    }

    fn activate<W>(&mut self, ctx: &mut TrapContext<'_, W>)
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        self.core.activation = None;
        if !self.core.transition(TrapState::Active) {
            return;
        }
        ctx.events.publish(HerdEvent::TrapActivated { trap: self.core.id });
        let duration = dispatch!(&mut self.kind, t => t.on_activate(&mut self.core, ctx));
        if duration > 0.0 {
            self.core.deactivation = Some(self.core.timers.schedule(duration, TrapTimer::Deactivate));
        } else {
            self.deactivate(ctx);
        }
    }

    fn deactivate<W>(&mut self, ctx: &mut TrapContext<'_, W>)
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        self.core.deactivation = None;
        if self.core.state != TrapState::Active {
            return;
        }
        ctx.events.publish(HerdEvent::TrapDeactivated { trap: self.core.id });
        dispatch!(&mut self.kind, t => t.on_deactivate(&mut self.core, ctx));

        if self.core.config.single_use {
            self.core.cancel_lifecycle_timers();
            if self.core.transition(TrapState::Disabled) {
                info!(trap = %self.core.id, "Single-use trap spent");
                ctx.events.publish(HerdEvent::TrapDisabled { trap: self.core.id });
            }
            return;
        }
        self.core.transition(TrapState::Cooldown);
        let cooldown = self.core.config.cooldown_duration;
        if cooldown > 0.0 {
            self.core.cooldown = Some(self.core.timers.schedule(cooldown, TrapTimer::Cooldown));
        } else {
            self.arm(ctx.events);
        }
    }

    fn fire<W>(&mut self, timer: TrapTimer, ctx: &mut TrapContext<'_, W>)
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        match timer {
            TrapTimer::Activate => self.activate(ctx),
            TrapTimer::Deactivate => self.deactivate(ctx),
            TrapTimer::Cooldown => {
                self.core.cooldown = None;
                self.arm(ctx.events);
            }
            TrapTimer::ArmingComplete => {
                self.core.arming = None;
                self.arm(ctx.events);
            }
            TrapTimer::ResumeSteering(agent) => {
                ctx.herd.resume(agent, SuspensionReason::Launched);
            }
        }
    }

    /// Re-query the trigger box and dispatch begin/end overlaps.
    pub fn sense<W>(&mut self, ctx: &mut TrapContext<'_, W>)
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        for event in self.core.volume.update(&*ctx.world) {
            match event {
                OverlapEvent::Begin { agent, kind } => self.on_overlap_begin(agent, kind, ctx),
                OverlapEvent::End { agent } => self.on_overlap_end(agent),
            }
        }
    }

    /// Advance the trap by one tick: overlaps, the kind's own update, then
    /// due timers. A state entered when a timer fires is first updated on
    /// the following tick.
    pub fn tick<W>(&mut self, dt: f32, ctx: &mut TrapContext<'_, W>)
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        self.sense(ctx);
        self.core.time_in_state += dt;
        dispatch!(&mut self.kind, t => t.on_tick(dt, &mut self.core, ctx));
        for fired in self.core.timers.advance(dt) {
            self.fire(fired.payload, ctx);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use herding_agents::SteeringConfig;
    use herding_world::{PhysicsConfig, SimWorld, Terrain};

    use super::*;

    struct Fixture {
        world: SimWorld,
        herd: Herd,
        events: EventBus,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                world: SimWorld::new(Terrain::flat(10_000.0), PhysicsConfig::default()),
                herd: Herd::new(),
                events: EventBus::new(),
            }
        }

        fn cow(&mut self, at: Vec3) -> AgentId {
            let id = self.world.spawn(AgentKind::Cow, at).unwrap();
            self.herd.spawn(&mut self.world, id, SteeringConfig::default(), 0).unwrap();
            id
        }

        fn ctx(&mut self) -> TrapContext<'_, SimWorld> {
            TrapContext {
                world: &mut self.world,
                herd: &mut self.herd,
                events: &mut self.events,
            }
        }
    }

    fn quiet_spike() -> SpikeConfig {
        SpikeConfig {
            show_warning: false,
            ..SpikeConfig::default()
        }
    }

    /// Drive a trap into `target` through legal transitions only.
    fn drive_to(trap: &mut Trap, f: &mut Fixture, cow: AgentId, target: TrapState) {
        trap.reset(&mut f.ctx());
        match target {
            TrapState::Idle => {
                trap.core.state = TrapState::Idle;
            }
            TrapState::Armed => {}
            TrapState::Triggered => trap.on_overlap_begin(cow, AgentKind::Cow, &mut f.ctx()),
            TrapState::Active => {
                trap.on_overlap_begin(cow, AgentKind::Cow, &mut f.ctx());
                trap.tick(1.0, &mut f.ctx());
            }
            TrapState::Cooldown => {
                trap.on_overlap_begin(cow, AgentKind::Cow, &mut f.ctx());
                trap.tick(1.0, &mut f.ctx());
                trap.tick(2.0, &mut f.ctx());
            }
            TrapState::Disabled => {
                trap.disarm(&mut f.ctx());
            }
        }
        assert_eq!(trap.state(), target);
    }

    #[test]
    fn spike_runs_the_full_cycle() {
        let mut f = Fixture::new();
        let cow = f.cow(Vec3::new(5000.0, 0.0, 0.0));
        let mut trap = Trap::spike(Vec3::ZERO, quiet_spike());
        trap.reset(&mut f.ctx());
        assert_eq!(trap.state(), TrapState::Armed);

        trap.on_overlap_begin(cow, AgentKind::Cow, &mut f.ctx());
        assert_eq!(trap.state(), TrapState::Triggered);
        assert_eq!(trap.core().last_triggering_agent(), Some(cow));
        assert!((trap.core().activation_remaining().unwrap() - 1.0).abs() < 1e-6);

        trap.tick(1.0, &mut f.ctx());
        assert_eq!(trap.state(), TrapState::Active);
        trap.tick(2.0, &mut f.ctx());
        assert_eq!(trap.state(), TrapState::Cooldown);
        trap.tick(3.0, &mut f.ctx());
        assert_eq!(trap.state(), TrapState::Armed);
    }

    #[test]
    fn shepherd_does_not_trigger_by_default() {
        let mut f = Fixture::new();
        let mut trap = Trap::spike(Vec3::ZERO, quiet_spike());
        trap.reset(&mut f.ctx());
        trap.on_overlap_begin(AgentId::new(), AgentKind::Shepherd, &mut f.ctx());
        assert_eq!(trap.state(), TrapState::Armed);
        assert!(trap.core().actors_in_trigger().is_empty());
    }

    #[test]
    fn shepherd_triggers_when_allowed() {
        let mut f = Fixture::new();
        let config = SpikeConfig {
            trap: TrapConfig {
                can_trigger_on_player: true,
                ..TrapConfig::spike()
            },
            ..quiet_spike()
        };
        let mut trap = Trap::spike(Vec3::ZERO, config);
        trap.reset(&mut f.ctx());
        trap.on_overlap_begin(AgentId::new(), AgentKind::Shepherd, &mut f.ctx());
        assert_eq!(trap.state(), TrapState::Triggered);
    }

    #[test]
    fn only_armed_traps_accept_triggers() {
        for state in TrapState::ALL {
            let mut f = Fixture::new();
            let first = f.cow(Vec3::new(5000.0, 0.0, 0.0));
            let second = f.cow(Vec3::new(-5000.0, 0.0, 0.0));
            let mut trap = Trap::spike(Vec3::ZERO, quiet_spike());
            drive_to(&mut trap, &mut f, first, state);

            trap.on_overlap_begin(second, AgentKind::Cow, &mut f.ctx());
            let expected = if state == TrapState::Armed {
                TrapState::Triggered
            } else {
                state
            };
            assert_eq!(trap.state(), expected, "trigger from {state:?}");
        }
    }

    #[test]
    fn arm_only_from_idle_or_cooldown() {
        for state in TrapState::ALL {
            let mut f = Fixture::new();
            let cow = f.cow(Vec3::new(5000.0, 0.0, 0.0));
            let mut trap = Trap::spike(Vec3::ZERO, quiet_spike());
            drive_to(&mut trap, &mut f, cow, state);

            let armed = trap.arm(&mut f.events);
            let legal = matches!(state, TrapState::Idle | TrapState::Cooldown);
            assert_eq!(armed, legal, "arm from {state:?}");
            let expected = if legal { TrapState::Armed } else { state };
            assert_eq!(trap.state(), expected);
        }
    }

    #[test]
    fn every_observed_transition_is_legal() {
        let mut f = Fixture::new();
        let cow = f.cow(Vec3::new(5000.0, 0.0, 0.0));
        let mut trap = Trap::spike(Vec3::ZERO, quiet_spike());
        trap.reset(&mut f.ctx());
        let mut previous = trap.state();
        trap.on_overlap_begin(cow, AgentKind::Cow, &mut f.ctx());
        for _ in 0..600 {
            trap.tick(1.0 / 60.0, &mut f.ctx());
            let current = trap.state();
            if current != previous {
                assert!(previous.can_transition_to(current), "{previous:?} -> {current:?}");
                previous = current;
            }
        }
    }

    #[test]
    fn disarm_cancels_pending_activation() {
        let mut f = Fixture::new();
        let cow = f.cow(Vec3::new(5000.0, 0.0, 0.0));
        let mut trap = Trap::spike(Vec3::ZERO, quiet_spike());
        trap.reset(&mut f.ctx());
        trap.on_overlap_begin(cow, AgentKind::Cow, &mut f.ctx());
        assert!(trap.disarm(&mut f.ctx()));
        assert!(!trap.disarm(&mut f.ctx()));
        trap.tick(5.0, &mut f.ctx());
        assert_eq!(trap.state(), TrapState::Disabled);
        assert!(trap.core().activation_remaining().is_none());
    }

    #[test]
    fn reset_leaves_disabled_and_rearms() {
        let mut f = Fixture::new();
        let mut trap = Trap::spike(Vec3::ZERO, quiet_spike());
        trap.reset(&mut f.ctx());
        trap.disarm(&mut f.ctx());
        assert!(!trap.arm(&mut f.events));
        trap.reset(&mut f.ctx());
        assert_eq!(trap.state(), TrapState::Armed);
    }

    #[test]
    fn traps_not_started_armed_reset_to_disabled() {
        let mut f = Fixture::new();
        let config = SpikeConfig {
            trap: TrapConfig {
                start_armed: false,
                ..TrapConfig::spike()
            },
            ..quiet_spike()
        };
        let mut trap = Trap::spike(Vec3::ZERO, config);
        trap.reset(&mut f.ctx());
        assert_eq!(trap.state(), TrapState::Disabled);
    }

    #[test]
    fn single_use_traps_disable_after_one_activation() {
        let mut f = Fixture::new();
        let cow = f.cow(Vec3::new(5000.0, 0.0, 0.0));
        let config = SpikeConfig {
            trap: TrapConfig {
                single_use: true,
                ..TrapConfig::spike()
            },
            ..quiet_spike()
        };
        let mut trap = Trap::spike(Vec3::ZERO, config);
        trap.reset(&mut f.ctx());
        trap.on_overlap_begin(cow, AgentKind::Cow, &mut f.ctx());
        trap.tick(1.0, &mut f.ctx());
        trap.tick(2.0, &mut f.ctx());
        assert_eq!(trap.state(), TrapState::Disabled);
        assert!(f.events.pending().contains(&HerdEvent::TrapDisabled { trap: trap.id() }));
    }

    #[test]
    fn single_use_deactivation_is_announced_once() {
        let mut f = Fixture::new();
        let cow = f.cow(Vec3::new(5000.0, 0.0, 0.0));
        let config = SpikeConfig {
            trap: TrapConfig {
                single_use: true,
                ..TrapConfig::spike()
            },
            ..quiet_spike()
        };
        let mut trap = Trap::spike(Vec3::ZERO, config);
        trap.reset(&mut f.ctx());
        f.events.drain();

        trap.on_overlap_begin(cow, AgentKind::Cow, &mut f.ctx());
        trap.tick(1.0, &mut f.ctx());
        trap.tick(2.0, &mut f.ctx());

        let events = f.events.drain();
        let count = |wanted: &HerdEvent| events.iter().filter(|e| *e == wanted).count();
        assert_eq!(count(&HerdEvent::TrapDeactivated { trap: trap.id() }), 1);
        assert_eq!(count(&HerdEvent::TrapDisabled { trap: trap.id() }), 1);
        assert_eq!(trap.state(), TrapState::Disabled);
        assert!(trap.core().cooldown_remaining().is_none());
        // Already spent: a later disarm has nothing to announce.
        assert!(!trap.disarm(&mut f.ctx()));
        assert!(f.events.is_empty());
    }

    #[test]
    fn zero_activation_delay_activates_immediately() {
        let mut f = Fixture::new();
        let cow = f.cow(Vec3::new(5000.0, 0.0, 0.0));
        let config = SpikeConfig {
            trap: TrapConfig {
                activation_delay: 0.0,
                ..TrapConfig::spike()
            },
            ..quiet_spike()
        };
        let mut trap = Trap::spike(Vec3::ZERO, config);
        trap.reset(&mut f.ctx());
        trap.on_overlap_begin(cow, AgentKind::Cow, &mut f.ctx());
        assert_eq!(trap.state(), TrapState::Active);
    }

    #[test]
    fn overlap_tracking_is_independent_of_state() {
        let mut f = Fixture::new();
        let cow = f.cow(Vec3::new(5000.0, 0.0, 0.0));
        let mut trap = Trap::spike(Vec3::ZERO, quiet_spike());
        trap.reset(&mut f.ctx());
        trap.disarm(&mut f.ctx());
        trap.on_overlap_begin(cow, AgentKind::Cow, &mut f.ctx());
        assert!(trap.core().actors_in_trigger().contains_key(&cow));
        trap.on_overlap_end(cow);
        assert!(trap.core().actors_in_trigger().is_empty());
    }

    #[test]
    fn sense_triggers_from_world_overlaps() {
        let mut f = Fixture::new();
        let cow = f.cow(Vec3::new(5000.0, 0.0, 0.0));
        let mut trap = Trap::spike(Vec3::ZERO, quiet_spike());
        trap.reset(&mut f.ctx());
        trap.tick(0.1, &mut f.ctx());
        assert_eq!(trap.state(), TrapState::Armed);

        f.world.set_position(cow, Vec3::new(20.0, 0.0, 0.0));
        trap.tick(0.1, &mut f.ctx());
        assert_eq!(trap.state(), TrapState::Triggered);
        assert_eq!(trap.core().last_triggering_agent(), Some(cow));
    }
}
