//! Tunables for herd steering and the shepherd controller.
//!
//! Distances are world units, speeds units per second, and weights are
//! dimensionless multipliers on steering forces. Both structs deserialize
//! from the `steering` and `shepherd` sections of `herding-config.yaml`;
//! every field is optional and falls back to the default documented here.

use glam::Vec3;
use serde::Deserialize;

/// Per-cow steering parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    // --- Wander ---
    /// Cruising speed while wandering (default: 150).
    pub wander_speed: f32,
    /// Cap on the magnitude of the combined steering force (default: 150).
    pub max_steer_force: f32,
    /// Radius of the wander circle (default: 100).
    pub wander_radius: f32,
    /// Distance of the wander circle ahead of the cow (default: 200).
    pub wander_distance: f32,
    /// Per-tick random displacement of the wander target (default: 40).
    pub wander_jitter: f32,

    // --- Separation ---
    /// Peers closer than this push the cow away (default: 150).
    pub separation_radius: f32,
    /// Weight of the separation force (default: 2).
    pub separation_weight: f32,
    /// Radius of the peer query (default: 500).
    pub perception_radius: f32,

    // --- Avoidance ---
    /// Weight of obstacle and cliff forces (default: 3).
    pub obstacle_avoidance_weight: f32,
    /// Extra multiplier on avoidance while it is active (default: 3).
    pub safety_priority_multiplier: f32,
    /// Ground probe distance ahead of the cow (default: 300).
    pub cliff_avoidance_distance: f32,
    /// Length of the wall feeler rays (default: 200).
    pub wall_avoidance_distance: f32,
    /// Height of the wall feeler rays above the feet (default: 50).
    pub feeler_height: f32,
    /// Lateral spread of the side feelers relative to forward (default: 0.5).
    pub feeler_spread: f32,
    /// Fraction of interaction force kept while avoiding (default: 0.2).
    pub avoidance_interaction_scale: f32,

    // --- Shepherd interaction ---
    /// Cows within this distance of the shepherd react to it (default: 1900).
    pub player_detection_radius: f32,
    /// Weight of the attraction force (default: 1.5).
    pub attraction_weight: f32,
    /// Weight of the repulsion force (default: 2.5).
    pub repulsion_weight: f32,
    /// Nominal speed while attracted (default: 250).
    pub attraction_speed: f32,
    /// Speed while fleeing (default: 350).
    pub repulsion_speed: f32,
    /// Attracted cows stop inside this distance (default: 200).
    pub attraction_stop_distance: f32,
    /// Attracted cows slow down inside this distance (default: 400).
    pub attraction_slowdown_distance: f32,

    // --- Laser ---
    /// Weight of the laser attraction force (default: 2).
    pub laser_attraction_weight: f32,
    /// Nominal speed toward the laser point (default: 300).
    pub laser_attraction_speed: f32,
    /// Cows stop inside this distance of the laser point (default: 100).
    pub laser_stop_distance: f32,
    /// Cows slow down inside this distance of the laser point (default: 300).
    pub laser_slowdown_distance: f32,

    // --- Speed and orientation ---
    /// Ease the applied walk speed toward the target speed (default: true).
    pub smooth_speed_transitions: bool,
    /// Exponential rate of the walk speed easing, per second (default: 2).
    pub speed_transition_rate: f32,
    /// Rate at which the cow turns to face its velocity (default: 5).
    pub rotation_interp_speed: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            wander_speed: 150.0,
            max_steer_force: 150.0,
            wander_radius: 100.0,
            wander_distance: 200.0,
            wander_jitter: 40.0,
            separation_radius: 150.0,
            separation_weight: 2.0,
            perception_radius: 500.0,
            obstacle_avoidance_weight: 3.0,
            safety_priority_multiplier: 3.0,
            cliff_avoidance_distance: 300.0,
            wall_avoidance_distance: 200.0,
            feeler_height: 50.0,
            feeler_spread: 0.5,
            avoidance_interaction_scale: 0.2,
            player_detection_radius: 1900.0,
            attraction_weight: 1.5,
            repulsion_weight: 2.5,
            attraction_speed: 250.0,
            repulsion_speed: 350.0,
            attraction_stop_distance: 200.0,
            attraction_slowdown_distance: 400.0,
            laser_attraction_weight: 2.0,
            laser_attraction_speed: 300.0,
            laser_stop_distance: 100.0,
            laser_slowdown_distance: 300.0,
            smooth_speed_transitions: true,
            speed_transition_rate: 2.0,
            rotation_interp_speed: 5.0,
        }
    }
}

/// Shepherd controller parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShepherdConfig {
    /// Seconds between nearby-cow rescans (default: 0.2).
    pub rescan_interval: f32,
    /// Walk speed of the shepherd body (default: 600).
    pub walk_speed: f32,

    // --- Carry ---
    /// Maximum distance to a cow that can be picked up (default: 200).
    pub pickup_range: f32,
    /// Full angle of the pickup cone in degrees (default: 90).
    pub pickup_angle: f32,
    /// Carry point in the shepherd's frame: x forward, y right, z up
    /// (default: 100, 0, 80).
    pub carry_offset: Vec3,
    /// Rate at which the carried cow follows the carry point (default: 10).
    pub carry_interp_speed: f32,
    /// Place the carry point along the camera's aim instead of the body's
    /// facing (default: false).
    pub camera_relative_carry: bool,
    /// Fraction of the camera pitch applied to the carry point (default: 0.5).
    pub carry_pitch_damping: f32,

    // --- Throw ---
    /// Launch speed at zero charge (default: 500).
    pub min_throw_speed: f32,
    /// Launch speed at full charge (default: 1500).
    pub max_throw_speed: f32,
    /// Seconds to reach full charge (default: 2).
    pub max_charge_time: f32,
    /// Upward pitch of every throw in degrees (default: 30).
    pub throw_pitch_degrees: f32,
    /// Throw along the camera's aim instead of the body's facing
    /// (default: false).
    pub camera_relative_throw: bool,
    /// Seconds before a thrown cow steers again (default: 1).
    pub throw_steering_resume_delay: f32,

    // --- Laser ---
    /// Maximum laser trace length (default: 5000).
    pub laser_max_range: f32,
    /// Cows within this distance of the laser point are attracted
    /// (default: 1500).
    pub laser_attraction_radius: f32,
    /// Height of the laser origin above the shepherd's feet (default: 60).
    pub eye_height: f32,
}

impl Default for ShepherdConfig {
    fn default() -> Self {
        Self {
            rescan_interval: 0.2,
            walk_speed: 600.0,
            pickup_range: 200.0,
            pickup_angle: 90.0,
            carry_offset: Vec3::new(100.0, 0.0, 80.0),
            carry_interp_speed: 10.0,
            camera_relative_carry: false,
            carry_pitch_damping: 0.5,
            min_throw_speed: 500.0,
            max_throw_speed: 1500.0,
            max_charge_time: 2.0,
            throw_pitch_degrees: 30.0,
            camera_relative_throw: false,
            throw_steering_resume_delay: 1.0,
            laser_max_range: 5000.0,
            laser_attraction_radius: 1500.0,
            eye_height: 60.0,
        }
    }
}
