//! Configuration loading and typed config structures for the herding game.
//!
//! The canonical configuration lives in `herding-config.yaml` at the project
//! root. Every section is optional; missing sections and fields fall back to
//! the defaults documented on each struct.

use std::path::Path;

use glam::Vec3;
use herding_agents::{ShepherdConfig, SteeringConfig};
use herding_world::PhysicsConfig;
use serde::Deserialize;

use crate::hazard::{LandmineConfig, SpikeConfig};
use crate::session::SessionConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level game configuration.
///
/// Mirrors the structure of `herding-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GameConfig {
    /// Level layout and population.
    #[serde(default)]
    pub world: WorldConfig,

    /// Kinematic body model.
    #[serde(default)]
    pub physics: PhysicsConfig,

    /// Per-cow steering.
    #[serde(default)]
    pub steering: SteeringConfig,

    /// Shepherd controller.
    #[serde(default)]
    pub shepherd: ShepherdConfig,

    /// Landmine parameters, shared by every mine in the level.
    #[serde(default)]
    pub landmine: LandmineConfig,

    /// Spike trap parameters, shared by every spike trap in the level.
    #[serde(default)]
    pub spike: SpikeConfig,

    /// Timed session.
    #[serde(default)]
    pub session: SessionConfig,

    /// Run loop bounds and pacing.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GameConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// Level layout and population.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Random seed for cow placement and per-cow wander streams.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of cows spawned at the start.
    #[serde(default = "default_cow_count")]
    pub cow_count: u32,

    /// Centre of the cow spawn disc.
    #[serde(default)]
    pub spawn_center: Vec3,

    /// Radius of the cow spawn disc.
    #[serde(default = "default_spawn_radius")]
    pub spawn_radius: f32,

    /// Where the shepherd starts.
    #[serde(default = "default_shepherd_start")]
    pub shepherd_start: Vec3,

    /// Centre of the goal volume.
    #[serde(default = "default_goal_center")]
    pub goal_center: Vec3,

    /// Half size of the square ground slab.
    #[serde(default = "default_terrain_half_size")]
    pub terrain_half_size: f32,

    /// Landmine positions.
    #[serde(default = "default_landmines")]
    pub landmines: Vec<Vec3>,

    /// Spike trap positions.
    #[serde(default = "default_spikes")]
    pub spikes: Vec<Vec3>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            cow_count: default_cow_count(),
            spawn_center: Vec3::ZERO,
            spawn_radius: default_spawn_radius(),
            shepherd_start: default_shepherd_start(),
            goal_center: default_goal_center(),
            terrain_half_size: default_terrain_half_size(),
            landmines: default_landmines(),
            spikes: default_spikes(),
        }
    }
}

/// Run loop bounds and pacing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Simulated ticks per second; each tick advances `1 / tick_rate_hz`.
    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: f32,

    /// Stop after this many ticks (0 = run until the session ends).
    #[serde(default)]
    pub max_ticks: u64,

    /// Pace ticks against the wall clock instead of running flat out.
    #[serde(default)]
    pub real_time: bool,

    /// Stop when the last cow dies.
    #[serde(default = "default_true")]
    pub stop_when_herd_lost: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: default_tick_rate_hz(),
            max_ticks: 0,
            real_time: false,
            stop_when_herd_lost: default_true(),
        }
    }
}

impl SimulationConfig {
    /// Seconds simulated per tick.
    pub fn tick_seconds(&self) -> f32 {
        if self.tick_rate_hz > 0.0 {
            1.0 / self.tick_rate_hz
        } else {
            1.0 / default_tick_rate_hz()
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

const fn default_cow_count() -> u32 {
    12
}

const fn default_spawn_radius() -> f32 {
    1500.0
}

const fn default_shepherd_start() -> Vec3 {
    Vec3::new(-2000.0, 0.0, 0.0)
}

const fn default_goal_center() -> Vec3 {
    Vec3::new(4000.0, 0.0, 0.0)
}

const fn default_terrain_half_size() -> f32 {
    8000.0
}

fn default_landmines() -> Vec<Vec3> {
    vec![Vec3::new(1500.0, 1200.0, 0.0), Vec3::new(2500.0, -1000.0, 0.0)]
}

fn default_spikes() -> Vec<Vec3> {
    vec![Vec3::new(2200.0, 0.0, 0.0)]
}

const fn default_tick_rate_hz() -> f32 {
    60.0
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GameConfig::default();
        assert_eq!(config.world.seed, 42);
        assert_eq!(config.world.cow_count, 12);
        assert!((config.session.duration - 120.0).abs() < f32::EPSILON);
        assert!((config.simulation.tick_seconds() - 1.0 / 60.0).abs() < f32::EPSILON);
        assert!((config.landmine.trap.activation_delay - 0.1).abs() < f32::EPSILON);
        assert!((config.spike.trap.activation_delay - 1.0).abs() < f32::EPSILON);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
world:
  seed: 7
  cow_count: 30
  spawn_center: [100.0, 0.0, 0.0]
  spawn_radius: 900.0
  shepherd_start: [0.0, -500.0, 0.0]
  goal_center: [5000.0, 0.0, 0.0]
  terrain_half_size: 12000.0
  landmines:
    - [1000.0, 0.0, 0.0]
  spikes: []

physics:
  gravity: 500.0
  kill_z: -1000.0

steering:
  wander_speed: 120.0
  separation_radius: 250.0

shepherd:
  rescan_interval: 0.5
  max_throw_speed: 2000.0

landmine:
  explosion_radius: 800.0
  trap:
    cooldown_duration: 10.0
    single_use: true

spike:
  max_height: 150.0
  show_warning: false

session:
  duration: 60.0
  auto_start: false

simulation:
  tick_rate_hz: 30.0
  max_ticks: 500
  real_time: true

logging:
  level: "debug"
"#;

        let config = GameConfig::parse(yaml);
        assert!(config.is_ok(), "parse failed: {config:?}");
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.world.seed, 7);
        assert_eq!(config.world.cow_count, 30);
        assert_eq!(config.world.landmines.len(), 1);
        assert!(config.world.spikes.is_empty());
        assert!((config.physics.kill_z + 1000.0).abs() < f32::EPSILON);
        assert!((config.steering.wander_speed - 120.0).abs() < f32::EPSILON);
        assert!((config.shepherd.rescan_interval - 0.5).abs() < f32::EPSILON);
        assert!((config.landmine.explosion_radius - 800.0).abs() < f32::EPSILON);
        assert!(config.landmine.trap.single_use);
        assert!((config.landmine.trap.cooldown_duration - 10.0).abs() < f32::EPSILON);
        assert!(!config.spike.show_warning);
        assert!(!config.session.auto_start);
        assert_eq!(config.simulation.max_ticks, 500);
        assert!(config.simulation.real_time);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "world:\n  seed: 9\n";
        let config = GameConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        // Seed is overridden
        assert_eq!(config.world.seed, 9);
        // Everything else uses defaults
        assert_eq!(config.world.cow_count, 12);
        assert_eq!(config.world.landmines.len(), 2);
        assert_eq!(config.simulation, SimulationConfig::default());
    }

    #[test]
    fn parse_empty_yaml() {
        let config = GameConfig::parse("");
        assert!(config.is_ok());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let config = GameConfig::parse("world: [not, a, map");
        assert!(matches!(config, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let config = GameConfig::from_file(Path::new("/nonexistent/herding-config.yaml"));
        assert!(matches!(config, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("herding-config.yaml");
        if path.exists() {
            let config = GameConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
