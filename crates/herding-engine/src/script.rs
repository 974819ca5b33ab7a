//! Scripted shepherd input for unattended runs.
//!
//! A [`ScriptedShepherd`] replays timed cues (single commands on a given
//! tick) and walking legs (a direction held over a tick range, optionally
//! only every `stride` ticks to slow the shepherd down). The demo script
//! built by [`ScriptedShepherd::demo`] walks up to the herd, leads it
//! toward the goal with attraction, then shows off the laser and a throw.

use std::collections::BTreeMap;

use glam::Vec3;
use herding_core::config::GameConfig;
use herding_core::input::{InputError, InputSource, ShepherdCommand};

/// Gap kept between the shepherd and the edge of the herd on approach.
const APPROACH_MARGIN: f32 = 500.0;

/// While leading, the shepherd only steps on one tick in this many.
const LEAD_STRIDE: u64 = 3;

/// Lead pace as a fraction of walking speed.
const LEAD_PACE: f32 = 1.0 / 3.0;

/// A direction held over a range of ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leg {
    /// First tick of the leg.
    pub start: u64,
    /// First tick after the leg.
    pub end: u64,
    /// World-space walk direction.
    pub direction: Vec3,
    /// Step on every `stride`-th tick of the leg; 0 never steps.
    pub stride: u64,
}

impl Leg {
    fn steps_on(&self, tick: u64) -> bool {
        tick < self.end
            && tick
                .checked_sub(self.start)
                .and_then(|n| n.checked_rem(self.stride))
                == Some(0)
    }
}

/// Input source that plays back a fixed script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedShepherd {
    cues: BTreeMap<u64, Vec<ShepherdCommand>>,
    legs: Vec<Leg>,
}

impl ScriptedShepherd {
    /// An empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue `command` on `tick`, after any cue already queued there.
    #[must_use]
    pub fn cue(mut self, tick: u64, command: ShepherdCommand) -> Self {
        self.cues.entry(tick).or_default().push(command);
        self
    }

    /// Walk toward `direction` from `start` (inclusive) to `end`
    /// (exclusive), stepping every `stride` ticks.
    #[must_use]
    pub fn walk(mut self, start: u64, end: u64, direction: Vec3, stride: u64) -> Self {
        self.legs.push(Leg {
            start,
            end,
            direction,
            stride,
        });
        self
    }

    /// Last tick on which the script does anything.
    pub fn last_tick(&self) -> u64 {
        let last_cue = self.cues.keys().next_back().copied().unwrap_or(0);
        let last_step = self
            .legs
            .iter()
            .map(|leg| leg.end.saturating_sub(1))
            .max()
            .unwrap_or(0);
        last_cue.max(last_step)
    }

    /// The demo run for a level built from `config`.
    pub fn demo(config: &GameConfig) -> Self {
        let hz = config.simulation.tick_rate_hz;
        let walk_speed = config.shepherd.walk_speed.max(1.0);
        let layout = &config.world;

        // Walk up to the herd.
        let to_herd = layout.spawn_center - layout.shepherd_start;
        let approach = (to_herd.length() - layout.spawn_radius - APPROACH_MARGIN).max(0.0);
        let approach_end = ticks_for(approach / walk_speed, hz).saturating_add(1);
        let standing = layout.shepherd_start + to_herd.normalize_or_zero() * approach;

        // Lead the herd to the goal at a walk the cows can keep up with.
        let to_goal = layout.goal_center - standing;
        let lead_seconds = to_goal.length() / (walk_speed * LEAD_PACE);
        let lead_start = approach_end.saturating_add(1);
        let lead_end = lead_start.saturating_add(ticks_for(lead_seconds, hz));
        let heading = to_goal.normalize_or_zero();

        let second = ticks_for(1.0, hz).max(1);
        let laser_on = lead_end.saturating_add(second);
        let laser_off = laser_on.saturating_add(second.saturating_mul(3));
        let pickup = laser_off.saturating_add(second);
        let release = pickup.saturating_add(second);

        Self::new()
            .walk(1, approach_end, to_herd.normalize_or_zero(), 1)
            .cue(approach_end, ShepherdCommand::ToggleAttraction)
            .walk(lead_start, lead_end, heading, LEAD_STRIDE)
            .cue(lead_end, ShepherdCommand::SetNeutral)
            .cue(laser_on, ShepherdCommand::Aim((heading - Vec3::Z * 0.2).normalize_or_zero()))
            .cue(laser_on, ShepherdCommand::LaserOn)
            .cue(laser_off, ShepherdCommand::LaserOff)
            .cue(pickup, ShepherdCommand::Aim(-heading))
            .cue(pickup, ShepherdCommand::Pickup)
            .cue(pickup.saturating_add(1), ShepherdCommand::StartThrow)
            .cue(release, ShepherdCommand::Aim(heading))
            .cue(release, ShepherdCommand::ReleaseThrow)
    }
}

impl InputSource for ScriptedShepherd {
    fn poll(&mut self, tick: u64) -> Result<Vec<ShepherdCommand>, InputError> {
        let mut commands = self.cues.get(&tick).cloned().unwrap_or_default();
        commands.extend(
            self.legs
                .iter()
                .filter(|leg| leg.steps_on(tick))
                .map(|leg| ShepherdCommand::Move(leg.direction)),
        );
        Ok(commands)
    }
}

/// Whole ticks covering `seconds` at `hz`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn ticks_for(seconds: f32, hz: f32) -> u64 {
    (seconds * hz).ceil().max(0.0) as u64
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cues_fire_on_their_tick_only() {
        let mut script = ScriptedShepherd::new()
            .cue(3, ShepherdCommand::Pickup)
            .cue(3, ShepherdCommand::StartThrow);
        assert!(script.poll(2).unwrap().is_empty());
        assert_eq!(
            script.poll(3).unwrap(),
            vec![ShepherdCommand::Pickup, ShepherdCommand::StartThrow]
        );
        assert!(script.poll(4).unwrap().is_empty());
    }

    #[test]
    fn strided_leg_steps_every_nth_tick() {
        let mut script = ScriptedShepherd::new().walk(10, 19, Vec3::X, 3);
        let stepped: Vec<u64> = (0..25)
            .filter(|&t| !script.poll(t).unwrap().is_empty())
            .collect();
        assert_eq!(stepped, vec![10, 13, 16]);
    }

    #[test]
    fn zero_stride_never_steps() {
        let mut script = ScriptedShepherd::new().walk(0, 10, Vec3::X, 0);
        assert!((0..10).all(|t| script.poll(t).unwrap().is_empty()));
    }

    #[test]
    fn cues_come_before_moves() {
        let mut script = ScriptedShepherd::new()
            .walk(1, 5, Vec3::Y, 1)
            .cue(2, ShepherdCommand::ToggleAttraction);
        assert_eq!(
            script.poll(2).unwrap(),
            vec![ShepherdCommand::ToggleAttraction, ShepherdCommand::Move(Vec3::Y)]
        );
    }

    #[test]
    fn demo_attracts_before_leading_and_ends_with_a_throw() {
        let config = GameConfig::default();
        let mut script = ScriptedShepherd::demo(&config);
        let last = script.last_tick();

        let mut first_attract = None;
        let mut release = None;
        for tick in 0..=last {
            for command in script.poll(tick).unwrap() {
                match command {
                    ShepherdCommand::ToggleAttraction if first_attract.is_none() => {
                        first_attract = Some(tick);
                    }
                    ShepherdCommand::ReleaseThrow => release = Some(tick),
                    _ => {}
                }
            }
        }

        let attract = first_attract.unwrap();
        assert!(release.unwrap() > attract);
        assert_eq!(release, Some(last));
        // Leading the herd 6 km at a third of walking pace takes half a minute.
        assert!(last > 30 * 60);
    }

    #[test]
    fn ticks_round_up() {
        assert_eq!(ticks_for(1.0, 60.0), 60);
        assert_eq!(ticks_for(0.01, 60.0), 1);
        assert_eq!(ticks_for(-2.0, 60.0), 0);
    }
}
