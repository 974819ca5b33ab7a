//! Shepherd-driven attraction flags carried by each cow.

use herding_types::AttractionState;

/// Whether a cow is currently attracted to or repulsed by the shepherd.
///
/// The setters keep the two flags mutually exclusive. Only the shepherd
/// controller calls them; steering reads the flags every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InteractionFlags {
    attracted: bool,
    repulsed: bool,
}

impl InteractionFlags {
    /// Flags with both values set directly, bypassing exclusivity.
    ///
    /// Steering resolves a doubly-flagged cow as repulsed.
    pub const fn from_raw(attracted: bool, repulsed: bool) -> Self {
        Self {
            attracted,
            repulsed,
        }
    }

    /// Set attraction; always clears repulsion.
    pub const fn set_attraction(&mut self, attracted: bool) {
        self.attracted = attracted;
        self.repulsed = false;
    }

    /// Set repulsion; always clears attraction.
    pub const fn set_repulsion(&mut self, repulsed: bool) {
        self.repulsed = repulsed;
        self.attracted = false;
    }

    /// Clear both flags.
    pub const fn clear(&mut self) {
        self.attracted = false;
        self.repulsed = false;
    }

    /// Raw attraction flag.
    pub const fn is_attracted(self) -> bool {
        self.attracted
    }

    /// Raw repulsion flag.
    pub const fn is_repulsed(self) -> bool {
        self.repulsed
    }

    /// Effective state; repulsion wins when both flags are set.
    pub const fn state(self) -> AttractionState {
        if self.repulsed {
            AttractionState::Repulsed
        } else if self.attracted {
            AttractionState::Attracted
        } else {
            AttractionState::None
        }
    }
}
