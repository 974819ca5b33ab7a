//! Input source trait and stub implementation.
//!
//! During the input phase of the tick cycle the engine asks an
//! [`InputSource`] what the shepherd should do this tick. The trait
//! abstracts where commands come from: a keyboard binding layer, a
//! scripted demo, a replay file, or a test stub.

use glam::Vec3;
use herding_types::ShepherdMode;

/// Errors that can occur while polling for input.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// The source has no more commands to give and cannot continue.
    #[error("input source exhausted at tick {tick}")]
    Exhausted {
        /// The tick that was being polled.
        tick: u64,
    },

    /// An internal error in the input source.
    #[error("input source error: {message}")]
    Internal {
        /// Description of the error.
        message: String,
    },
}

/// One shepherd command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShepherdCommand {
    /// Walk in a world-space direction this tick.
    Move(Vec3),
    /// Point the aim (camera forward, including pitch).
    Aim(Vec3),
    /// Switch directly to a mode.
    SetMode(ShepherdMode),
    /// Flip attraction on or off.
    ToggleAttraction,
    /// Flip repulsion on or off.
    ToggleRepulsion,
    /// Release every cow.
    SetNeutral,
    /// Pick up the cow in front, or drop the carried one.
    Pickup,
    /// Start charging a throw.
    StartThrow,
    /// Throw the carried cow with the charged power.
    ReleaseThrow,
    /// Abandon the charging throw.
    CancelThrow,
    /// Switch the laser on.
    LaserOn,
    /// Switch the laser off.
    LaserOff,
    /// End any running session and start a new one.
    RestartSession,
    /// Freeze the session clock.
    PauseSession,
    /// Continue the session clock.
    ResumeSession,
}

/// A source of shepherd commands.
pub trait InputSource {
    /// Commands to apply during `tick`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`InputError`] if the source cannot produce input at all.
    fn poll(&mut self, tick: u64) -> Result<Vec<ShepherdCommand>, InputError>;
}

/// An input source that never issues a command. The shepherd stands still.
#[derive(Debug, Clone, Default)]
pub struct StubInputSource;

impl StubInputSource {
    /// Create a new stub input source.
    pub const fn new() -> Self {
        Self
    }
}

impl InputSource for StubInputSource {
    fn poll(&mut self, _tick: u64) -> Result<Vec<ShepherdCommand>, InputError> {
        Ok(Vec::new())
    }
}
