//! Whole-game scenarios driven through the tick cycle.
//!
//! Each test builds a small level by hand, runs [`run_tick`] the way the
//! engine does, and checks what the tick summaries report.

// Integration tests use unwrap extensively for clarity -- panicking on
// failure is the correct behavior in test code.
#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::too_many_lines,
    clippy::missing_panics_doc
)]

use std::collections::BTreeMap;

use glam::Vec3;
use herding_agents::{InteractionController, ShepherdConfig, SteeringConfig};
use herding_core::config::GameConfig;
use herding_core::hazard::{LandmineConfig, SpikeConfig, Trap};
use herding_core::input::{InputError, InputSource, ShepherdCommand, StubInputSource};
use herding_core::session::SessionConfig;
use herding_core::tick::{GameState, TickSummary, run_tick};
use herding_types::{AgentId, AgentKind, HerdEvent, KillCause, SuspensionReason, TrapState};
use herding_world::{Aabb, MotionSubstrate, PhysicsConfig, SimWorld, SpatialQuery, Terrain};

const DT: f32 = 1.0 / 60.0;

/// Commands keyed by the tick they apply on.
struct Script(BTreeMap<u64, Vec<ShepherdCommand>>);

impl Script {
    fn new(commands: &[(u64, ShepherdCommand)]) -> Self {
        let mut by_tick: BTreeMap<u64, Vec<ShepherdCommand>> = BTreeMap::new();
        for (tick, command) in commands {
            by_tick.entry(*tick).or_default().push(*command);
        }
        Self(by_tick)
    }
}

impl InputSource for Script {
    fn poll(&mut self, tick: u64) -> Result<Vec<ShepherdCommand>, InputError> {
        Ok(self.0.remove(&tick).unwrap_or_default())
    }
}

fn level(terrain: Terrain, shepherd_at: Vec3, dt: f32) -> GameState {
    let mut world = SimWorld::new(terrain, PhysicsConfig::default());
    let shepherd = world.spawn(AgentKind::Shepherd, shepherd_at).unwrap();
    GameState::new(
        world,
        InteractionController::new(shepherd, ShepherdConfig::default()),
        Aabb::from_center(Vec3::new(6000.0, 0.0, 0.0), Vec3::new(1000.0, 1000.0, 500.0)),
        SessionConfig {
            auto_start: false,
            ..SessionConfig::default()
        },
        dt,
        11,
    )
}

/// Cows that stand still unless something moves them.
fn grazing() -> SteeringConfig {
    SteeringConfig {
        wander_speed: 0.0,
        ..SteeringConfig::default()
    }
}

fn run(state: &mut GameState, input: &mut dyn InputSource, ticks: u64) -> Vec<TickSummary> {
    (0..ticks).map(|_| run_tick(state, input).unwrap()).collect()
}

fn all_events(summaries: &[TickSummary]) -> Vec<HerdEvent> {
    summaries.iter().flat_map(|s| s.events.iter().cloned()).collect()
}

fn kills(events: &[HerdEvent]) -> Vec<(AgentId, KillCause)> {
    events
        .iter()
        .filter_map(|e| match e {
            HerdEvent::CowKilled { agent, cause } => Some((*agent, *cause)),
            _ => None,
        })
        .collect()
}

#[test]
fn wandering_cow_keeps_moving_at_wander_speed() {
    let mut state = level(Terrain::flat(20_000.0), Vec3::new(-5000.0, 0.0, 0.0), DT);
    let cow = state.spawn_cow(Vec3::ZERO, SteeringConfig::default()).unwrap();
    let mut input = StubInputSource::new();

    let mut last = state.world.body(cow).unwrap().position;
    let mut still_ticks = 0_u32;
    for _ in 0..300 {
        run_tick(&mut state, &mut input).unwrap();

        let speed = state.herd.get(cow).unwrap().steering().velocity().length();
        assert!(speed > 0.0, "steering velocity collapsed");
        assert!(speed <= 150.0 + 1e-3, "speed {speed} above wander speed");

        let now = state.world.body(cow).unwrap().position;
        if now.distance(last) < f32::EPSILON {
            still_ticks += 1;
            assert!(still_ticks <= 1, "cow stood still for two ticks");
        } else {
            still_ticks = 0;
        }
        last = now;
    }
}

#[test]
fn landmine_kills_the_center_and_launches_the_ring() {
    let mut state = level(Terrain::flat(10_000.0), Vec3::new(-3000.0, 0.0, 0.0), DT);
    let center = state.spawn_cow(Vec3::new(1010.0, 0.0, 0.0), grazing()).unwrap();
    let ring = state.spawn_cow(Vec3::new(1300.0, 0.0, 0.0), grazing()).unwrap();
    let outside = state.spawn_cow(Vec3::new(2000.0, 0.0, 0.0), grazing()).unwrap();
    state.add_trap(Trap::landmine(
        Vec3::new(1000.0, 0.0, 0.0),
        LandmineConfig {
            start_armed_after_delay: false,
            ..LandmineConfig::default()
        },
    ));
    assert_eq!(state.traps[0].state(), TrapState::Armed);
    let mut input = StubInputSource::new();

    let summaries = run(&mut state, &mut input, 12);
    let events = all_events(&summaries);

    assert_eq!(kills(&events), vec![(center, KillCause::Explosion)]);
    let launch = events
        .iter()
        .find_map(|e| match e {
            HerdEvent::CowLaunched { agent, velocity, .. } if *agent == ring => Some(*velocity),
            _ => None,
        })
        .unwrap();
    assert!(launch.x > 0.0 && launch.z > 0.0);
    assert!(events.iter().any(|e| matches!(e, HerdEvent::MineExploded { .. })));
    assert!(state.herd.is_steering(outside));
    assert!(
        state
            .herd
            .get(ring)
            .unwrap()
            .suspensions()
            .contains(&SuspensionReason::Launched)
    );

    // Launched cows get their steering back after the resume delay.
    run(&mut state, &mut input, 240);
    assert!(state.herd.is_steering(ring));
}

#[test]
fn blast_off_a_ledge_falls_out_of_the_world() {
    let mut state = level(Terrain::flat(600.0), Vec3::new(-500.0, 0.0, 0.0), DT);
    state.spawn_cow(Vec3::ZERO, grazing()).unwrap();
    let flyer = state.spawn_cow(Vec3::new(300.0, 0.0, 0.0), grazing()).unwrap();
    state.add_trap(Trap::landmine(
        Vec3::ZERO,
        LandmineConfig {
            start_armed_after_delay: false,
            ..LandmineConfig::default()
        },
    ));
    let mut input = StubInputSource::new();

    let events = all_events(&run(&mut state, &mut input, 600));

    assert!(kills(&events).contains(&(flyer, KillCause::FellOutOfWorld)));
    assert!(!state.herd.contains(flyer));
    assert!(!state.world.exists(flyer));
    assert_eq!(state.herd.len(), 0);
}

#[test]
fn session_clock_ends_exactly_once() {
    let mut state = level(Terrain::flat(10_000.0), Vec3::new(-3000.0, 0.0, 0.0), 1.0);
    let mut input = Script::new(&[(1, ShepherdCommand::RestartSession)]);

    let summaries = run(&mut state, &mut input, 130);

    let ends: Vec<u64> = summaries
        .iter()
        .filter(|s| s.session_ended())
        .map(|s| s.tick)
        .collect();
    // Started during tick 1's input phase; a second comes off each tick.
    assert_eq!(ends, vec![120]);
    assert!(summaries[119].remaining_time.abs() < f32::EPSILON);
    assert!(!summaries[129].session_active);
}

#[test]
fn spike_trap_cycles_through_legal_states_and_kills_each_cow_once() {
    let mut state = level(Terrain::flat(10_000.0), Vec3::new(-3000.0, 0.0, 0.0), DT);
    state.add_trap(Trap::spike(Vec3::new(1000.0, 0.0, 0.0), SpikeConfig::default()));
    let mut input = StubInputSource::new();

    let mut spawned = Vec::new();
    let mut waiting: Option<AgentId> = None;
    let mut states = vec![state.traps[0].state()];
    let mut events = Vec::new();

    for _ in 0..3000 {
        if state.traps[0].state() == TrapState::Armed && waiting.is_none() {
            let cow = state.spawn_cow(Vec3::new(1030.0, 20.0, 0.0), grazing()).unwrap();
            spawned.push(cow);
            waiting = Some(cow);
        }
        let summary = run_tick(&mut state, &mut input).unwrap();
        if waiting.is_some_and(|cow| !state.herd.contains(cow)) {
            waiting = None;
        }
        let now = state.traps[0].state();
        if states.last() != Some(&now) {
            states.push(now);
        }
        events.extend(summary.events);
    }

    for pair in states.windows(2) {
        assert!(
            pair[0].can_transition_to(pair[1]),
            "illegal transition {:?} -> {:?}",
            pair[0],
            pair[1]
        );
    }
    let cycle = [
        TrapState::Armed,
        TrapState::Triggered,
        TrapState::Active,
        TrapState::Cooldown,
        TrapState::Armed,
    ];
    assert!(states.windows(5).any(|w| w == cycle));

    let killed = kills(&events);
    assert!(killed.len() >= 5, "only {} kills", killed.len());
    for (agent, cause) in &killed {
        assert_eq!(*cause, KillCause::Spikes);
        assert_eq!(killed.iter().filter(|(a, _)| a == agent).count(), 1);
    }
    // Every cow but possibly the one still on the plate has died.
    assert!(spawned.len() - killed.len() <= 1);
}

#[test]
fn pickup_charge_and_throw_round_trip() {
    let mut state = level(Terrain::flat(10_000.0), Vec3::ZERO, DT);
    let cow = state.spawn_cow(Vec3::new(150.0, 0.0, 0.0), grazing()).unwrap();
    let mut input = Script::new(&[
        (1, ShepherdCommand::Pickup),
        (2, ShepherdCommand::StartThrow),
        (62, ShepherdCommand::ReleaseThrow),
    ]);

    let first = run(&mut state, &mut input, 1);
    assert!(first[0].events.contains(&HerdEvent::CowPickedUp { agent: cow }));
    assert_eq!(state.shepherd.carry().carried(), Some(cow));
    assert!(!state.herd.is_steering(cow));

    let events = all_events(&run(&mut state, &mut input, 61));
    let (velocity, power) = events
        .iter()
        .find_map(|e| match e {
            HerdEvent::CowThrown {
                agent,
                velocity,
                power,
            } if *agent == cow => Some((*velocity, *power)),
            _ => None,
        })
        .unwrap();
    // One second of a two-second charge.
    assert!((power - 0.5).abs() < 0.05, "power {power}");
    assert!((velocity.length() - 1000.0).abs() < 60.0);
    assert!(velocity.z > 0.0);
    assert!(!state.shepherd.carry().is_carrying());
    assert!(state.shepherd.has_pending_resume(cow));

    run(&mut state, &mut input, 90);
    assert!(state.herd.is_steering(cow));
    assert!(!state.shepherd.has_pending_resume(cow));
}

#[test]
fn goal_volume_counts_arrivals_and_departures() {
    let mut state = level(Terrain::flat(10_000.0), Vec3::new(-3000.0, 0.0, 0.0), DT);
    let cow = state.spawn_cow(Vec3::new(4000.0, 0.0, 0.0), grazing()).unwrap();
    let mut input = Script::new(&[(1, ShepherdCommand::RestartSession)]);
    run(&mut state, &mut input, 1);
    assert_eq!(state.session.count(), 0);

    state.world.set_position(cow, Vec3::new(6000.0, 0.0, 0.0));
    let entered = run(&mut state, &mut input, 1);
    assert_eq!(entered[0].cows_in_goal, 1);
    assert!(entered[0].events.contains(&HerdEvent::CowCountChanged { count: 1 }));

    state.world.set_position(cow, Vec3::new(4000.0, 0.0, 0.0));
    let left = run(&mut state, &mut input, 1);
    assert_eq!(left[0].cows_in_goal, 0);
}

#[test]
fn config_file_round_trip() {
    let yaml = "world:\n  seed: 5\n  cow_count: 3\nsession:\n  duration: 45.0\n";
    let path = std::env::temp_dir().join(format!("herding-config-{}.yaml", std::process::id()));
    std::fs::write(&path, yaml).unwrap();

    let from_file = GameConfig::from_file(&path).unwrap();
    let parsed = GameConfig::parse(yaml).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(from_file, parsed);
    assert_eq!(from_file.world.seed, 5);
    assert_eq!(from_file.world.cow_count, 3);
    assert!((from_file.session.duration - 45.0).abs() < f32::EPSILON);
}
