//! Geometry primitives and interpolation helpers shared by every crate.
//!
//! The world is Z-up. An identity rotation faces `+X`; an agent's right
//! side is `forward x up`.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Distances below this are treated as zero.
pub const KINDA_SMALL: f32 = 1.0e-4;

/// An axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Build a box from any two opposite corners.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Build a box from its center and half extents.
    pub fn from_center(center: Vec3, half_extent: Vec3) -> Self {
        let half = half_extent.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Center of the box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Whether `point` lies inside or on the box.
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Whether `point` lies within the box's horizontal footprint.
    pub fn contains_xy(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Entry distance and surface normal of a ray against this box.
    ///
    /// `direction` must be normalized. Rays starting inside the box do not
    /// register a hit.
    pub fn ray_entry(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<(f32, Vec3)> {
        let axes = [Vec3::X, Vec3::Y, Vec3::Z];
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut normal = Vec3::ZERO;

        for (axis, (((o, d), lo), hi)) in axes.iter().zip(
            origin
                .to_array()
                .into_iter()
                .zip(direction.to_array())
                .zip(self.min.to_array())
                .zip(self.max.to_array()),
        ) {
            if d.abs() < f32::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let (near, far, face) = if d > 0.0 {
                ((lo - o) / d, (hi - o) / d, -*axis)
            } else {
                ((hi - o) / d, (lo - o) / d, *axis)
            };
            if near > t_enter {
                t_enter = near;
                normal = face;
            }
            t_exit = t_exit.min(far);
        }

        if t_enter > t_exit || t_enter < 0.0 || t_enter > max_distance {
            return None;
        }
        Some((t_enter, normal))
    }
}

/// The ground-plane component of a vector.
pub const fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, 0.0)
}

/// Exponential approach of `current` toward `target`.
///
/// Moves `current` by the fraction `clamp(dt * speed, 0, 1)` of the
/// remaining distance. A non-positive `speed` snaps to the target.
pub fn interp_to(current: f32, target: f32, dt: f32, speed: f32) -> f32 {
    if speed <= 0.0 {
        return target;
    }
    let distance = target - current;
    if distance * distance < KINDA_SMALL * KINDA_SMALL {
        return target;
    }
    current + distance * (dt * speed).clamp(0.0, 1.0)
}

/// Vector form of [`interp_to`].
pub fn interp_vec_to(current: Vec3, target: Vec3, dt: f32, speed: f32) -> Vec3 {
    if speed <= 0.0 {
        return target;
    }
    let distance = target - current;
    if distance.length_squared() < KINDA_SMALL * KINDA_SMALL {
        return target;
    }
    current + distance * (dt * speed).clamp(0.0, 1.0)
}

/// Rotation toward `target` by the fraction `clamp(dt * speed, 0, 1)`.
pub fn interp_rotation_to(current: Quat, target: Quat, dt: f32, speed: f32) -> Quat {
    if speed <= 0.0 {
        return target;
    }
    current.slerp(target, (dt * speed).clamp(0.0, 1.0)).normalize()
}

/// Upright rotation facing along the horizontal part of `direction`.
///
/// Returns identity for vertical or zero directions.
pub fn yaw_rotation(direction: Vec3) -> Quat {
    let flat = flatten(direction);
    if flat.length_squared() < KINDA_SMALL {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_z(flat.y.atan2(flat.x))
}

/// Linear interpolation between two scalars.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    (b - a).mul_add(t, a)
}

/// Position and orientation of a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Feet position.
    pub position: Vec3,
    /// Orientation.
    pub rotation: Quat,
}

impl Pose {
    /// Unit vector the body faces.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Unit vector to the body's right.
    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Z).normalize_or_zero()
    }

    /// Transform a point from the body's local frame (`x` forward, `y`
    /// right, `z` up) into world space.
    pub fn local_to_world(&self, local: Vec3) -> Vec3 {
        self.position + self.forward() * local.x + self.right() * local.y + Vec3::Z * local.z
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn ray_hits_near_face_with_outward_normal() {
        let block = Aabb::new(Vec3::new(100.0, -50.0, 0.0), Vec3::new(200.0, 50.0, 100.0));
        let (distance, normal) = block.ray_entry(Vec3::new(0.0, 0.0, 50.0), Vec3::X, 500.0).unwrap();
        assert!((distance - 100.0).abs() < 1e-4);
        assert_eq!(normal, Vec3::NEG_X);
    }

    #[test]
    fn ray_misses_beyond_max_distance() {
        let block = Aabb::new(Vec3::new(100.0, -50.0, 0.0), Vec3::new(200.0, 50.0, 100.0));
        assert!(block.ray_entry(Vec3::new(0.0, 0.0, 50.0), Vec3::X, 99.0).is_none());
    }

    #[test]
    fn ray_from_inside_does_not_hit() {
        let block = Aabb::new(Vec3::splat(-10.0), Vec3::splat(10.0));
        assert!(block.ray_entry(Vec3::ZERO, Vec3::X, 100.0).is_none());
    }

    #[test]
    fn downward_ray_hits_top_face() {
        let ground = Aabb::new(Vec3::new(-100.0, -100.0, -50.0), Vec3::new(100.0, 100.0, 0.0));
        let (distance, normal) = ground
            .ray_entry(Vec3::new(10.0, 10.0, 100.0), Vec3::NEG_Z, 600.0)
            .unwrap();
        assert!((distance - 100.0).abs() < 1e-4);
        assert_eq!(normal, Vec3::Z);
    }

    #[test]
    fn interp_to_converges_without_overshoot() {
        let mut value = 0.0;
        for _ in 0..600 {
            value = interp_to(value, 150.0, 1.0 / 60.0, 2.0);
            assert!(value <= 150.0);
        }
        assert!((value - 150.0).abs() < 1e-2);
    }

    #[test]
    fn interp_to_snaps_with_zero_speed() {
        assert_eq!(interp_to(3.0, 9.0, 0.1, 0.0), 9.0);
    }

    #[test]
    fn right_is_clockwise_of_forward() {
        let pose = Pose {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        };
        assert!((pose.right() - Vec3::NEG_Y).length() < 1e-5);
        let ahead = pose.local_to_world(Vec3::new(200.0, 0.0, 0.0));
        assert!((ahead - Vec3::new(200.0, 0.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn yaw_rotation_faces_direction() {
        let rotation = yaw_rotation(Vec3::new(0.0, 5.0, 3.0));
        assert!(((rotation * Vec3::X) - Vec3::Y).length() < 1e-5);
        assert_eq!(yaw_rotation(Vec3::Z), Quat::IDENTITY);
    }
}
