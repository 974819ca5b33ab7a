//! Static level geometry built from solid boxes.
//!
//! Ground, plateaus and walls are all [`Aabb`] blocks. The walkable
//! surface at a point is the highest block top beneath it; anywhere with no
//! block underneath is a drop.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::geometry::Aabb;
use crate::spatial::Hit;

/// Solid static geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Terrain {
    blocks: Vec<Aabb>,
}

impl Terrain {
    /// Terrain made of the given blocks.
    pub const fn new(blocks: Vec<Aabb>) -> Self {
        Self { blocks }
    }

    /// A single square slab whose top surface sits at `z = 0`.
    pub fn flat(half_size: f32) -> Self {
        Self::new(vec![Aabb::new(
            Vec3::new(-half_size, -half_size, -100.0),
            Vec3::new(half_size, half_size, 0.0),
        )])
    }

    /// Add a block.
    #[must_use]
    pub fn with_block(mut self, block: Aabb) -> Self {
        self.blocks.push(block);
        self
    }

    /// All blocks.
    pub fn blocks(&self) -> &[Aabb] {
        &self.blocks
    }

    /// Nearest block hit along a normalized ray.
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<Hit> {
        self.blocks
            .iter()
            .filter_map(|block| block.ray_entry(origin, direction, max_distance))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(distance, normal)| Hit {
                point: origin + direction * distance,
                normal,
                distance,
                agent: None,
            })
    }

    /// Height of the highest block top under `point` that is no more than
    /// `tolerance` above it.
    pub fn ground_height(&self, point: Vec3, tolerance: f32) -> Option<f32> {
        self.blocks
            .iter()
            .filter(|block| block.contains_xy(point) && block.max.z <= point.z + tolerance)
            .map(|block| block.max.z)
            .max_by(f32::total_cmp)
    }
}
