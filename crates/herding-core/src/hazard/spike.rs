//! Spike trap: impales the cows standing on its plate.
//!
//! Triggering can start a warning phase that also stretches the activation
//! delay, so the telegraph and the strike line up. Once active the spikes
//! extend; every cow on the plate dies the first time the spikes pass half
//! height and any cow that steps on afterwards dies too, each exactly once
//! per activation.

use std::collections::BTreeSet;

use herding_types::{AgentId, HazardKind, HerdEvent, KillCause, TrapState};
use herding_world::geometry::interp_to;
use herding_world::{MotionSubstrate, SpatialQuery};
use serde::Deserialize;
use tracing::debug;

use super::{TrapBehavior, TrapConfig, TrapContext, TrapCore};

/// Heights within this distance of their target snap to it.
const SNAP_TOLERANCE: f32 = 1.0;

/// Spike trap parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpikeConfig {
    /// Shared lifecycle parameters (default: 1 s activation, 3 s cooldown).
    #[serde(default = "TrapConfig::spike")]
    pub trap: TrapConfig,
    /// Seconds the spikes stay up (default: 2).
    pub active_duration: f32,
    /// Retraction speed in units per second (default: 200).
    pub retract_speed: f32,
    /// Extension speed in units per second (default: 500).
    pub extend_speed: f32,
    /// Full spike height (default: 100).
    pub max_height: f32,
    /// Telegraph the strike before activating (default: true).
    pub show_warning: bool,
    /// Length of the warning phase in seconds (default: 1).
    pub warning_duration: f32,
}

impl Default for SpikeConfig {
    fn default() -> Self {
        Self {
            trap: TrapConfig::spike(),
            active_duration: 2.0,
            retract_speed: 200.0,
            extend_speed: 500.0,
            max_height: 100.0,
            show_warning: true,
            warning_duration: 1.0,
        }
    }
}

impl SpikeConfig {
    const fn warns(&self) -> bool {
        self.show_warning && self.warning_duration > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Motion {
    Still,
    Extending,
    Retracting,
}

/// Spike trap payload.
#[derive(Debug, Clone)]
pub struct SpikeTrap {
    config: SpikeConfig,
    height: f32,
    motion: Motion,
    warning: bool,
    warning_time: f32,
    killed: BTreeSet<AgentId>,
}

impl SpikeTrap {
    pub(crate) const fn new(config: SpikeConfig) -> Self {
        Self {
            config,
            height: 0.0,
            motion: Motion::Still,
            warning: false,
            warning_time: 0.0,
            killed: BTreeSet::new(),
        }
    }

    /// Spike trap parameters.
    pub const fn config(&self) -> &SpikeConfig {
        &self.config
    }

    /// Current spike height.
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Whether the spikes are moving up.
    pub fn is_extending(&self) -> bool {
        self.motion == Motion::Extending
    }

    /// Whether the spikes are moving down.
    pub fn is_retracting(&self) -> bool {
        self.motion == Motion::Retracting
    }

    /// Whether the warning phase is running.
    pub const fn is_warning(&self) -> bool {
        self.warning
    }

    /// Seconds into the warning phase.
    pub const fn warning_time(&self) -> f32 {
        self.warning_time
    }

    /// Cows killed during the current activation.
    pub const fn killed(&self) -> &BTreeSet<AgentId> {
        &self.killed
    }

    fn rate(&self, speed: f32) -> f32 {
        if self.config.max_height > 0.0 {
            speed / self.config.max_height
        } else {
            0.0
        }
    }

    fn kill_occupants<W>(&mut self, core: &mut TrapCore, ctx: &mut TrapContext<'_, W>)
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        for agent in core.cows_in_trigger() {
            if !self.killed.insert(agent) {
                continue;
            }
            core.forget(agent);
            if ctx.herd.kill(agent, ctx.world) {
                debug!(trap = %core.id(), agent = %agent, "Cow impaled");
                ctx.events.publish(HerdEvent::CowKilled {
                    agent,
                    cause: KillCause::Spikes,
                });
            }
        }
    }
}

impl TrapBehavior for SpikeTrap {
    fn hazard_kind(&self) -> HazardKind {
        HazardKind::Spike
    }

    fn activation_delay(&self, base: f32) -> f32 {
        if self.config.warns() {
            base.max(self.config.warning_duration)
        } else {
            base
        }
    }

    fn on_trigger<W>(&mut self, core: &mut TrapCore, ctx: &mut TrapContext<'_, W>)
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        if !self.config.warns() {
            return;
        }
        self.warning = true;
        self.warning_time = 0.0;
        ctx.events.publish(HerdEvent::SpikeWarning {
            trap: core.id(),
            duration: self.config.warning_duration,
        });
    }

    fn on_activate<W>(&mut self, _core: &mut TrapCore, _ctx: &mut TrapContext<'_, W>) -> f32
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        self.warning = false;
        self.warning_time = 0.0;
        self.motion = Motion::Extending;
        self.config.active_duration
    }

    fn on_deactivate<W>(&mut self, _core: &mut TrapCore, _ctx: &mut TrapContext<'_, W>)
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        self.motion = Motion::Retracting;
        self.killed.clear();
    }

    fn on_interrupt(&mut self) {
        self.warning = false;
        self.warning_time = 0.0;
    }

    fn on_tick<W>(&mut self, dt: f32, core: &mut TrapCore, ctx: &mut TrapContext<'_, W>)
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        if self.warning {
            self.warning_time += dt;
        }

        match self.motion {
            Motion::Extending => {
                let max = self.config.max_height;
                self.height = interp_to(self.height, max, dt, self.rate(self.config.extend_speed));
                if (self.height - max).abs() <= SNAP_TOLERANCE {
                    self.height = max;
                    self.motion = Motion::Still;
                    if core.state() == TrapState::Active {
                        self.kill_occupants(core, ctx);
                    }
                }
            }
            Motion::Retracting => {
                self.height = interp_to(self.height, 0.0, dt, self.rate(self.config.retract_speed));
                if self.height.abs() <= SNAP_TOLERANCE {
                    self.height = 0.0;
                    self.motion = Motion::Still;
                }
            }
            Motion::Still => {}
        }

        if core.state() == TrapState::Active && self.height > self.config.max_height * 0.5 {
            self.kill_occupants(core, ctx);
        }
    }
}
