//! Registry of live cows.
//!
//! The [`Herd`] owns each cow's steering state, its shepherd flags, and the
//! set of reasons its steering is suspended. Removing a cow from the herd is
//! how the simulation kills it; every stored [`AgentId`] elsewhere is
//! checked against [`Herd::contains`] before use.

use std::collections::{BTreeMap, BTreeSet};

use herding_types::{AgentId, SuspensionReason};
use herding_world::{MotionSubstrate, SpatialQuery};
use tracing::{debug, info};

use crate::config::SteeringConfig;
use crate::error::AgentError;
use crate::flags::InteractionFlags;
use crate::steering::{InteractionView, SteeringAgent};

/// One live cow.
#[derive(Debug, Clone)]
pub struct Cow {
    steering: SteeringAgent,
    flags: InteractionFlags,
    suspensions: BTreeSet<SuspensionReason>,
}

impl Cow {
    /// The cow's body ID.
    pub const fn id(&self) -> AgentId {
        self.steering.id()
    }

    /// Steering state.
    pub const fn steering(&self) -> &SteeringAgent {
        &self.steering
    }

    /// Shepherd flags.
    pub const fn flags(&self) -> InteractionFlags {
        self.flags
    }

    /// Reasons steering is currently paused.
    pub const fn suspensions(&self) -> &BTreeSet<SuspensionReason> {
        &self.suspensions
    }

    /// Whether steering runs this tick.
    pub fn is_steering(&self) -> bool {
        self.suspensions.is_empty()
    }
}

/// All live cows, keyed by body ID.
#[derive(Debug, Clone, Default)]
pub struct Herd {
    cows: BTreeMap<AgentId, Cow>,
}

impl Herd {
    /// Create an empty herd.
    pub const fn new() -> Self {
        Self {
            cows: BTreeMap::new(),
        }
    }

    /// Register a cow for an existing body.
    ///
    /// The body's walk speed cap starts at the cow's wander speed.
    pub fn spawn<W>(
        &mut self,
        world: &mut W,
        id: AgentId,
        config: SteeringConfig,
        seed: u64,
    ) -> Result<(), AgentError>
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        if !world.exists(id) {
            return Err(AgentError::MissingBody(id));
        }
        let wander_speed = config.wander_speed;
        self.insert(SteeringAgent::new(id, config, seed))?;
        world.set_max_walk_speed(id, wander_speed);
        Ok(())
    }

    /// Register a cow with prebuilt steering.
    pub fn insert(&mut self, steering: SteeringAgent) -> Result<(), AgentError> {
        let id = steering.id();
        if self.cows.contains_key(&id) {
            return Err(AgentError::DuplicateAgent(id));
        }
        self.cows.insert(
            id,
            Cow {
                steering,
                flags: InteractionFlags::default(),
                suspensions: BTreeSet::new(),
            },
        );
        Ok(())
    }

    /// Liveness check.
    pub fn contains(&self, id: AgentId) -> bool {
        self.cows.contains_key(&id)
    }

    /// Look up a live cow.
    pub fn get(&self, id: AgentId) -> Result<&Cow, AgentError> {
        self.cows.get(&id).ok_or(AgentError::AgentNotFound(id))
    }

    /// Live cows in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Cow> {
        self.cows.values()
    }

    /// IDs of live cows in ID order.
    pub fn ids(&self) -> Vec<AgentId> {
        self.cows.keys().copied().collect()
    }

    /// Number of live cows.
    pub fn len(&self) -> usize {
        self.cows.len()
    }

    /// Whether the herd is empty.
    pub fn is_empty(&self) -> bool {
        self.cows.is_empty()
    }

    /// Shepherd flags of a live cow.
    pub fn flags(&self, id: AgentId) -> Option<InteractionFlags> {
        self.cows.get(&id).map(|c| c.flags)
    }

    /// Set attraction (clearing repulsion). Returns whether the cow is alive.
    pub fn set_attraction(&mut self, id: AgentId, attracted: bool) -> bool {
        let Some(cow) = self.cows.get_mut(&id) else {
            return false;
        };
        cow.flags.set_attraction(attracted);
        true
    }

    /// Set repulsion (clearing attraction). Returns whether the cow is alive.
    pub fn set_repulsion(&mut self, id: AgentId, repulsed: bool) -> bool {
        let Some(cow) = self.cows.get_mut(&id) else {
            return false;
        };
        cow.flags.set_repulsion(repulsed);
        true
    }

    /// Clear both flags. Returns whether the cow is alive.
    pub fn clear_flags(&mut self, id: AgentId) -> bool {
        let Some(cow) = self.cows.get_mut(&id) else {
            return false;
        };
        cow.flags.clear();
        true
    }

    /// Pause steering for `reason`. Returns whether the reason was newly added.
    pub fn suspend(&mut self, id: AgentId, reason: SuspensionReason) -> bool {
        let Some(cow) = self.cows.get_mut(&id) else {
            return false;
        };
        let added = cow.suspensions.insert(reason);
        if added {
            debug!(agent = %id, ?reason, "Steering suspended");
        }
        added
    }

    /// Lift a suspension. Returns whether it was present.
    ///
    /// When the last suspension is lifted the cow's carried-over velocity is
    /// discarded so it starts steering from rest.
    pub fn resume(&mut self, id: AgentId, reason: SuspensionReason) -> bool {
        let Some(cow) = self.cows.get_mut(&id) else {
            return false;
        };
        let removed = cow.suspensions.remove(&reason);
        if removed {
            debug!(agent = %id, ?reason, "Steering resumed");
            if cow.suspensions.is_empty() {
                cow.steering.reset_motion();
            }
        }
        removed
    }

    /// Whether a live cow is currently steering.
    pub fn is_steering(&self, id: AgentId) -> bool {
        self.cows.get(&id).is_some_and(Cow::is_steering)
    }

    /// Kill a cow: drop it from the herd and despawn its body.
    ///
    /// Returns `false` if it was already dead.
    pub fn kill<M>(&mut self, id: AgentId, world: &mut M) -> bool
    where
        M: MotionSubstrate + ?Sized,
    {
        if self.cows.remove(&id).is_none() {
            return false;
        }
        world.despawn(id);
        info!(agent = %id, remaining = self.cows.len(), "Cow killed");
        true
    }

    /// Forget a cow whose body is already gone.
    pub fn remove(&mut self, id: AgentId) -> bool {
        self.cows.remove(&id).is_some()
    }

    /// Run steering for every unsuspended cow. Returns how many steered.
    pub fn tick<W>(&mut self, dt: f32, world: &mut W, view: Option<&InteractionView>) -> usize
    where
        W: SpatialQuery + MotionSubstrate + ?Sized,
    {
        let mut steered: usize = 0;
        for cow in self.cows.values_mut() {
            if !cow.is_steering() {
                continue;
            }
            if cow.steering.tick(dt, world, view, cow.flags).is_some() {
                steered = steered.saturating_add(1);
            }
        }
        steered
    }
}
