//! Level spawner: builds the starting [`GameState`] from configuration.
//!
//! The level is a square ground slab with the shepherd at its start point,
//! a herd scattered uniformly over a disc, the configured landmines and
//! spike traps, and the goal volume. Placement is driven by a seeded
//! [`SmallRng`] so the same configuration always yields the same level.

use std::f32::consts::TAU;

use glam::Vec3;
use herding_agents::InteractionController;
use herding_core::config::GameConfig;
use herding_core::hazard::Trap;
use herding_core::tick::GameState;
use herding_types::AgentKind;
use herding_world::{Aabb, SimWorld, Terrain};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::error::EngineError;

/// Offset between the placement stream and the per-cow wander streams.
const SCATTER_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// Build the level described by `config` and begin its session.
///
/// # Errors
///
/// Returns [`EngineError::Level`] if the ground slab has no area, and
/// [`EngineError::World`] or [`EngineError::Spawn`] if a body lands off
/// the ground.
pub fn build_level(config: &GameConfig) -> Result<GameState, EngineError> {
    let layout = &config.world;
    if layout.terrain_half_size <= 0.0 {
        return Err(EngineError::Level {
            message: format!("terrain_half_size must be positive, got {}", layout.terrain_half_size),
        });
    }

    let mut world = SimWorld::new(Terrain::flat(layout.terrain_half_size), config.physics.clone());
    let shepherd = world.spawn(AgentKind::Shepherd, layout.shepherd_start)?;
    let goal = Aabb::from_center(layout.goal_center, config.session.goal_half_extent);

    let mut state = GameState::new(
        world,
        InteractionController::new(shepherd, config.shepherd.clone()),
        goal,
        config.session.clone(),
        config.simulation.tick_seconds(),
        layout.seed,
    );

    let mut rng = SmallRng::seed_from_u64(layout.seed ^ SCATTER_STREAM);
    for _ in 0..layout.cow_count {
        let position = scatter(&mut rng, layout.spawn_center, layout.spawn_radius);
        state.spawn_cow(position, config.steering.clone())?;
    }

    for &position in &layout.landmines {
        state.add_trap(Trap::landmine(position, config.landmine.clone()));
    }
    for &position in &layout.spikes {
        state.add_trap(Trap::spike(position, config.spike.clone()));
    }

    state.begin();

    info!(
        shepherd = %shepherd,
        cows = state.herd.len(),
        traps = state.traps.len(),
        goal = ?layout.goal_center,
        "Level built"
    );

    Ok(state)
}

/// A point drawn uniformly from the horizontal disc around `center`.
fn scatter(rng: &mut impl Rng, center: Vec3, radius: f32) -> Vec3 {
    if radius <= 0.0 {
        return center;
    }
    let angle = rng.random_range(0.0..TAU);
    let distance = radius * rng.random::<f32>().sqrt();
    center + Vec3::new(angle.cos(), angle.sin(), 0.0) * distance
}
