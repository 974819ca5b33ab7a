//! Tick cycle: the phase loop that drives one herding game.
//!
//! Each tick runs through these phases in order:
//!
//! 1. **Input** -- poll the [`InputSource`] and apply the shepherd commands.
//! 2. **Controller** -- lift expired throw grace periods, trace the laser,
//!    carry, charge, and rescan the nearby cows on the rescan interval.
//! 3. **Steering** -- every unsuspended cow computes and applies its
//!    steering against a snapshot of the shepherd.
//! 4. **Hazards** -- each trap senses its trigger box, updates, and fires
//!    its due timers.
//! 5. **World step** -- integrate the bodies; cows that fell below the
//!    world are killed.
//! 6. **Goal** -- diff the goal volume and update the session count.
//! 7. **Session** -- advance the countdown.
//!
//! Notifications published during the tick are drained into the returned
//! [`TickSummary`]. The cycle is deterministic given the same initial state
//! and input.

use glam::Vec3;
use herding_agents::{AgentError, Herd, InteractionController, SteeringConfig};
use herding_types::{AgentId, AgentKind, HerdEvent, KillCause, ShepherdMode};
use herding_world::{Aabb, EventBus, OverlapEvent, OverlapWatcher, SimWorld, WorldError};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::hazard::{Trap, TrapContext};
use crate::input::{InputError, InputSource, ShepherdCommand};
use crate::session::{SessionConfig, SessionCounter};

/// Errors that can occur during tick execution or level setup.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The input source failed.
    #[error("input error: {source}")]
    Input {
        /// The underlying input error.
        #[from]
        source: InputError,
    },

    /// A herd registry operation failed.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// A world registry operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },
}

/// Summary of a completed tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// The tick number that just ran (1-based).
    pub tick: u64,
    /// Notifications published during the tick, in order.
    pub events: Vec<HerdEvent>,
    /// Cows still alive.
    pub cows_alive: usize,
    /// Cows counted by the session.
    pub cows_in_goal: usize,
    /// Seconds left on the session clock.
    pub remaining_time: f32,
    /// Whether a session is running.
    pub session_active: bool,
}

impl TickSummary {
    /// Number of cows killed this tick.
    pub fn kills(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, HerdEvent::CowKilled { .. }))
            .count()
    }

    /// Whether the session ended this tick.
    pub fn session_ended(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, HerdEvent::GameEnded { .. }))
    }
}

/// Everything one game needs between ticks.
#[derive(Debug)]
pub struct GameState {
    /// The world substrate.
    pub world: SimWorld,
    /// Live cows.
    pub herd: Herd,
    /// The shepherd controller.
    pub shepherd: InteractionController,
    /// Traps in the level.
    pub traps: Vec<Trap>,
    /// Cow occupancy of the goal volume.
    pub goal: OverlapWatcher,
    /// The timed session.
    pub session: SessionCounter,
    /// Notifications published since the last drain.
    pub events: EventBus,
    /// Seconds simulated per tick.
    pub dt: f32,
    /// Ticks completed so far.
    pub tick: u64,
    rng: SmallRng,
}

impl GameState {
    /// Build a game around an existing world and shepherd, with no cows or
    /// traps yet.
    ///
    /// `seed` drives the per-cow wander streams handed out by
    /// [`GameState::spawn_cow`].
    pub fn new(
        world: SimWorld,
        shepherd: InteractionController,
        goal: Aabb,
        session: SessionConfig,
        dt: f32,
        seed: u64,
    ) -> Self {
        Self {
            world,
            herd: Herd::new(),
            shepherd,
            traps: Vec::new(),
            goal: OverlapWatcher::new(goal, Some(AgentKind::Cow)),
            session: SessionCounter::new(session),
            events: EventBus::new(),
            dt,
            tick: 0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Spawn a cow body at `position` and register it with the herd.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::World`] or [`TickError::Agent`] if either
    /// registry rejects the new cow.
    pub fn spawn_cow(&mut self, position: Vec3, config: SteeringConfig) -> Result<AgentId, TickError> {
        let id = self.world.spawn(AgentKind::Cow, position)?;
        let seed: u64 = self.rng.random();
        self.herd.spawn(&mut self.world, id, config, seed)?;
        debug!(agent = %id, ?position, "Cow spawned");
        Ok(id)
    }

    /// Bring a trap into play: reset it and add it to the level.
    pub fn add_trap(&mut self, mut trap: Trap) {
        let mut ctx = TrapContext {
            world: &mut self.world,
            herd: &mut self.herd,
            events: &mut self.events,
        };
        trap.reset(&mut ctx);
        info!(trap = %trap.id(), kind = ?trap.hazard_kind(), "Trap placed");
        self.traps.push(trap);
    }

    /// The trap at `index`, in placement order.
    pub fn trap(&self, index: usize) -> Option<&Trap> {
        self.traps.get(index)
    }

    /// Seed the goal volume with whoever is standing in it now and start
    /// the session, or schedule its automatic start.
    pub fn begin(&mut self) {
        self.goal.update(&self.world);
        if self.session.config().auto_start {
            let delay = self.session.config().auto_start_delay;
            if delay > 0.0 {
                self.session.schedule_auto_start(delay);
            } else {
                let occupants = self.goal.occupants().clone();
                self.session.start(occupants, &mut self.events);
            }
        }
    }

    fn apply(&mut self, command: ShepherdCommand) {
        let Self {
            world,
            herd,
            shepherd,
            events,
            session,
            goal,
            ..
        } = self;
        match command {
            ShepherdCommand::Move(direction) => shepherd.move_input(world, direction),
            ShepherdCommand::Aim(direction) => shepherd.set_aim(world, direction),
            ShepherdCommand::SetMode(ShepherdMode::LaserAttraction) | ShepherdCommand::LaserOn => {
                shepherd.start_laser(herd, &*world, events);
            }
            ShepherdCommand::SetMode(mode) => {
                shepherd.set_mode(mode, herd, &*world, events);
            }
            ShepherdCommand::ToggleAttraction => {
                shepherd.toggle_attraction(herd, &*world, events);
            }
            ShepherdCommand::ToggleRepulsion => {
                shepherd.toggle_repulsion(herd, &*world, events);
            }
            ShepherdCommand::SetNeutral => {
                shepherd.set_neutral(herd, &*world, events);
            }
            ShepherdCommand::Pickup => {
                shepherd.try_pickup(herd, world, events);
            }
            ShepherdCommand::StartThrow => {
                shepherd.start_charge();
            }
            ShepherdCommand::ReleaseThrow => {
                shepherd.release_throw(herd, world, events);
            }
            ShepherdCommand::CancelThrow => {
                shepherd.cancel_charge();
            }
            ShepherdCommand::LaserOff => {
                shepherd.stop_laser(herd, &*world, events);
            }
            ShepherdCommand::RestartSession => {
                session.restart(goal.occupants().iter().copied(), events);
            }
            ShepherdCommand::PauseSession => {
                session.pause();
            }
            ShepherdCommand::ResumeSession => {
                session.resume();
            }
        }
    }
}

/// Execute a single tick of the game.
///
/// # Errors
///
/// Returns [`TickError::Input`] if the input source fails. Gameplay itself
/// never fails: invalid requests are ignored and logged.
pub fn run_tick(state: &mut GameState, input: &mut dyn InputSource) -> Result<TickSummary, TickError> {
    let tick = state.tick.saturating_add(1);
    let dt = state.dt;

    // --- Phase 1: Input ---
    for command in input.poll(tick)? {
        state.apply(command);
    }

    // --- Phase 2: Controller ---
    state
        .shepherd
        .tick(dt, &mut state.herd, &mut state.world, &mut state.events);

    // --- Phase 3: Steering ---
    let view = state.shepherd.view(&state.world);
    state.herd.tick(dt, &mut state.world, view.as_ref());

    // --- Phase 4: Hazards ---
    {
        let mut ctx = TrapContext {
            world: &mut state.world,
            herd: &mut state.herd,
            events: &mut state.events,
        };
        for trap in &mut state.traps {
            trap.tick(dt, &mut ctx);
        }
    }

    // --- Phase 5: World step ---
    for fallen in state.world.step(dt) {
        if state.herd.remove(fallen) {
            info!(agent = %fallen, "Cow fell out of the world");
            state.events.publish(HerdEvent::CowKilled {
                agent: fallen,
                cause: KillCause::FellOutOfWorld,
            });
        } else if fallen == state.shepherd.id() {
            warn!(agent = %fallen, "Shepherd fell out of the world");
        }
    }

    // --- Phase 6: Goal ---
    for change in state.goal.update(&state.world) {
        match change {
            OverlapEvent::Begin { agent, .. } => {
                state.session.register(agent, &mut state.events);
            }
            OverlapEvent::End { agent } => {
                state.session.unregister(agent, &mut state.events);
            }
        }
    }

    // --- Phase 7: Session ---
    state
        .session
        .tick(dt, state.goal.occupants(), &mut state.events);

    state.tick = tick;
    let summary = TickSummary {
        tick,
        events: state.events.drain(),
        cows_alive: state.herd.len(),
        cows_in_goal: state.session.count(),
        remaining_time: state.session.remaining_time(),
        session_active: state.session.is_active(),
    };
    debug!(
        tick,
        cows_alive = summary.cows_alive,
        cows_in_goal = summary.cows_in_goal,
        events = summary.events.len(),
        "Tick complete"
    );
    Ok(summary)
}
