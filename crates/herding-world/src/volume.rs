//! Begin/end overlap tracking for fixed trigger volumes.
//!
//! Hazard trigger boxes and the goal volume are static [`Aabb`]s. An
//! [`OverlapWatcher`] diffs the set of bodies inside its box against the
//! previous tick and reports who entered and who left.

use std::collections::BTreeSet;

use herding_types::{AgentId, AgentKind};

use crate::geometry::Aabb;
use crate::spatial::SpatialQuery;

/// A change in volume occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapEvent {
    /// A body entered the volume.
    Begin {
        /// The entering body.
        agent: AgentId,
        /// Its kind.
        kind: AgentKind,
    },
    /// A body left the volume, or stopped existing while inside it.
    End {
        /// The departing body.
        agent: AgentId,
    },
}

/// Tracks which bodies occupy a fixed box.
#[derive(Debug, Clone)]
pub struct OverlapWatcher {
    bounds: Aabb,
    filter: Option<AgentKind>,
    occupants: BTreeSet<AgentId>,
}

impl OverlapWatcher {
    /// Watch `bounds` for bodies of `filter` kind (any kind when `None`).
    pub const fn new(bounds: Aabb, filter: Option<AgentKind>) -> Self {
        Self {
            bounds,
            filter,
            occupants: BTreeSet::new(),
        }
    }

    /// The watched box.
    pub const fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Bodies inside as of the last update.
    pub const fn occupants(&self) -> &BTreeSet<AgentId> {
        &self.occupants
    }

    /// Re-query the volume. Ends are reported before begins.
    pub fn update<Q: SpatialQuery + ?Sized>(&mut self, world: &Q) -> Vec<OverlapEvent> {
        let current: BTreeSet<AgentId> = world
            .overlap_box(&self.bounds, self.filter)
            .into_iter()
            .collect();

        let mut events: Vec<OverlapEvent> = self
            .occupants
            .difference(&current)
            .map(|agent| OverlapEvent::End { agent: *agent })
            .collect();
        events.extend(current.difference(&self.occupants).filter_map(|agent| {
            world
                .kind(*agent)
                .map(|kind| OverlapEvent::Begin { agent: *agent, kind })
        }));

        self.occupants = current;
        events
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::motion::MotionSubstrate;
    use crate::sim_world::{PhysicsConfig, SimWorld};
    use crate::terrain::Terrain;

    #[test]
    fn reports_begin_then_end() {
        let mut world = SimWorld::new(Terrain::flat(5000.0), PhysicsConfig::default());
        let cow = world.spawn(AgentKind::Cow, Vec3::new(1000.0, 0.0, 0.0)).unwrap();
        let mut watcher = OverlapWatcher::new(
            Aabb::from_center(Vec3::ZERO, Vec3::new(100.0, 100.0, 100.0)),
            Some(AgentKind::Cow),
        );
        assert!(watcher.update(&world).is_empty());

        world.set_position(cow, Vec3::ZERO);
        assert_eq!(
            watcher.update(&world),
            vec![OverlapEvent::Begin {
                agent: cow,
                kind: AgentKind::Cow
            }]
        );
        assert!(watcher.update(&world).is_empty());

        world.despawn(cow);
        assert_eq!(watcher.update(&world), vec![OverlapEvent::End { agent: cow }]);
        assert!(watcher.occupants().is_empty());
    }

    #[test]
    fn bodies_already_inside_begin_on_first_update() {
        let mut world = SimWorld::new(Terrain::flat(5000.0), PhysicsConfig::default());
        let cow = world.spawn(AgentKind::Cow, Vec3::ZERO).unwrap();
        let mut watcher = OverlapWatcher::new(
            Aabb::from_center(Vec3::ZERO, Vec3::splat(100.0)),
            None,
        );
        assert_eq!(watcher.update(&world).len(), 1);
        assert!(watcher.occupants().contains(&cow));
    }
}
