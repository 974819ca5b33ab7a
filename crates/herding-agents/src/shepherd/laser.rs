//! Laser pointer mode.
//!
//! While active the laser is traced from the shepherd's eye along the aim
//! every tick. Cows near a valid impact point are attracted to it instead
//! of to the shepherd.

use glam::Vec3;
use herding_types::{HerdEvent, QueryChannel, ShepherdMode};
use herding_world::{EventBus, SpatialQuery};
use tracing::info;

use super::InteractionController;
use crate::herd::Herd;

/// Laser trace state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LaserState {
    active: bool,
    has_valid_hit: bool,
    impact_point: Vec3,
    mode_before: Option<ShepherdMode>,
}

impl LaserState {
    /// Whether the laser is on.
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the last trace struck something.
    pub const fn has_valid_hit(&self) -> bool {
        self.has_valid_hit
    }

    /// Last impact point, or the end of the trace when nothing was hit.
    pub const fn impact_point(&self) -> Vec3 {
        self.impact_point
    }

    /// The point cows should be drawn to, if any.
    pub const fn target(&self) -> Option<Vec3> {
        if self.active && self.has_valid_hit {
            Some(self.impact_point)
        } else {
            None
        }
    }

    fn activate(&mut self, previous: ShepherdMode) {
        self.active = true;
        self.mode_before = Some(previous);
    }

    pub(crate) const fn deactivate(&mut self) {
        self.active = false;
        self.has_valid_hit = false;
    }

    fn record(&mut self, point: Vec3, hit: bool) {
        self.impact_point = point;
        self.has_valid_hit = hit;
    }
}

impl InteractionController {
    /// Switch the laser on and enter laser attraction mode.
    ///
    /// Returns `false` if the laser was already on.
    pub fn start_laser<Q>(&mut self, herd: &mut Herd, world: &Q, events: &mut EventBus) -> bool
    where
        Q: SpatialQuery + ?Sized,
    {
        if self.laser.is_active() {
            return false;
        }
        self.laser.activate(self.mode);
        self.trace_laser(world);
        info!(hit = self.laser.has_valid_hit(), "Laser on");
        events.publish(HerdEvent::LaserToggled { active: true });
        self.set_mode(ShepherdMode::LaserAttraction, herd, world, events);
        true
    }

    /// Switch the laser off and return to the mode it interrupted.
    pub fn stop_laser<Q>(&mut self, herd: &mut Herd, world: &Q, events: &mut EventBus) -> bool
    where
        Q: SpatialQuery + ?Sized,
    {
        if !self.laser.is_active() {
            return false;
        }
        let restore = self
            .laser
            .mode_before
            .take()
            .filter(|mode| *mode != ShepherdMode::LaserAttraction)
            .unwrap_or(ShepherdMode::Neutral);
        self.laser.deactivate();
        info!(restore = ?restore, "Laser off");
        events.publish(HerdEvent::LaserToggled { active: false });
        self.set_mode(restore, herd, world, events);
        true
    }

    /// Flip the laser.
    pub fn toggle_laser<Q>(&mut self, herd: &mut Herd, world: &Q, events: &mut EventBus) -> bool
    where
        Q: SpatialQuery + ?Sized,
    {
        if self.laser.is_active() {
            self.stop_laser(herd, world, events)
        } else {
            self.start_laser(herd, world, events)
        }
    }

    /// Trace from the shepherd's eye along the aim and record the result.
    pub(crate) fn trace_laser<Q>(&mut self, world: &Q)
    where
        Q: SpatialQuery + ?Sized,
    {
        let Some(pose) = world.pose(self.id) else {
            self.laser.record(self.laser.impact_point, false);
            return;
        };
        let origin = pose.position + Vec3::Z * self.config.eye_height;
        let range = self.config.laser_max_range;
        match world.raycast(origin, self.aim, range, QueryChannel::Visibility, Some(self.id)) {
            Some(hit) => self.laser.record(hit.point, true),
            None => self.laser.record(origin + self.aim * range, false),
        }
    }
}
