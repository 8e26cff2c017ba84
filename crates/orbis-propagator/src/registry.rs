//! Propagator arena and delegation-tree validation.
//!
//! [`PropagatorRegistry`] owns every propagator of a composite tree and
//! hands out [`PropagatorId`] handles. Records that delegate a body store
//! the handle, so a nested propagator is never owned by the propagator
//! that delegates to it.
//!
//! [`validate_composition`](PropagatorRegistry::validate_composition) runs
//! before every top-level run to reject dangling handles and cyclic
//! delegation.

use std::collections::HashSet;

use indexmap::IndexSet;
use log::{debug, warn};
use orbis_core::{CompositionError, PropagatorId, Result};

use crate::context::PropagationContext;
use crate::propagator::Propagator;

struct Slot {
    name: String,
    /// `None` while the propagator is running.
    propagator: Option<Box<dyn Propagator>>,
}

/// Arena owning a tree of propagators.
#[derive(Default)]
pub struct PropagatorRegistry {
    slots: Vec<Slot>,
}

impl PropagatorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of propagators held.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no propagator was inserted.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Take ownership of a propagator and return its handle.
    pub fn insert<P: Propagator>(&mut self, propagator: P) -> PropagatorId {
        self.insert_boxed(Box::new(propagator))
    }

    /// Take ownership of a boxed propagator and return its handle.
    ///
    /// # Panics
    ///
    /// Panics if the registry already holds `u32::MAX + 1` propagators,
    /// the number of distinct [`PropagatorId`] values.
    pub fn insert_boxed(&mut self, propagator: Box<dyn Propagator>) -> PropagatorId {
        let Some(id) = slot_id(self.slots.len()) else {
            panic!("propagator registry is full ({} propagators)", self.slots.len());
        };
        debug!("registered propagator '{}' as {id}", propagator.name());
        self.slots.push(Slot {
            name: propagator.name().to_string(),
            propagator: Some(propagator),
        });
        id
    }

    /// Handles of every propagator, in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = PropagatorId> + '_ {
        (0..self.slots.len()).filter_map(slot_id)
    }

    /// Name of a propagator, available even while it is running.
    pub fn name(&self, id: PropagatorId) -> Option<&str> {
        self.slots.get(id.0 as usize).map(|s| s.name.as_str())
    }

    /// Shared access to a propagator.
    ///
    /// `None` for unknown handles and for propagators that are running.
    pub fn get(&self, id: PropagatorId) -> Option<&dyn Propagator> {
        self.slots.get(id.0 as usize)?.propagator.as_deref()
    }

    /// Mutable access to a propagator, for configuration between runs.
    pub fn get_mut(&mut self, id: PropagatorId) -> Option<&mut (dyn Propagator + 'static)> {
        self.slots.get_mut(id.0 as usize)?.propagator.as_deref_mut()
    }

    /// Validate and run the propagator `id`, delegating through this registry.
    pub fn propagate(&mut self, id: PropagatorId) -> Result<()> {
        self.validate_composition(id)?;
        let mut root = self.take(id)?;
        let outcome = {
            let mut ctx = PropagationContext::attached(self, 0);
            root.propagate(&mut ctx)
        };
        if let Err(e) = &outcome {
            warn!("run of '{}' ({id}) failed: {e}", root.name());
        }
        self.restore(id, root);
        outcome
    }

    /// Check the delegation tree reachable from `root`.
    ///
    /// Checks performed:
    ///
    /// 1. Every reachable handle refers to a propagator in this registry.
    /// 2. No propagator transitively delegates to itself.
    pub fn validate_composition(&self, root: PropagatorId) -> std::result::Result<(), CompositionError> {
        let mut path = IndexSet::new();
        let mut done = HashSet::new();
        self.visit(root, &mut path, &mut done)
    }

    fn visit(
        &self,
        id: PropagatorId,
        path: &mut IndexSet<PropagatorId>,
        done: &mut HashSet<PropagatorId>,
    ) -> std::result::Result<(), CompositionError> {
        if done.contains(&id) {
            return Ok(());
        }
        if let Some(start) = path.get_index_of(&id) {
            let mut cycle: Vec<PropagatorId> = path.iter().skip(start).copied().collect();
            cycle.push(id);
            return Err(CompositionError::Cycle { cycle });
        }
        let slot = self
            .slots
            .get(id.0 as usize)
            .ok_or(CompositionError::UnknownPropagator { id })?;
        let propagator = slot
            .propagator
            .as_deref()
            .ok_or(CompositionError::Reentrant { id })?;

        path.insert(id);
        for child in propagator.base().records().filter_map(|r| r.propagator()) {
            self.visit(child, path, done)?;
        }
        path.pop();
        done.insert(id);
        Ok(())
    }

    pub(crate) fn take(
        &mut self,
        id: PropagatorId,
    ) -> std::result::Result<Box<dyn Propagator>, CompositionError> {
        let slot = self
            .slots
            .get_mut(id.0 as usize)
            .ok_or(CompositionError::UnknownPropagator { id })?;
        slot.propagator
            .take()
            .ok_or(CompositionError::Reentrant { id })
    }

    pub(crate) fn restore(&mut self, id: PropagatorId, propagator: Box<dyn Propagator>) {
        if let Some(slot) = self.slots.get_mut(id.0 as usize) {
            slot.propagator = Some(propagator);
        }
    }
}

/// Handle for the slot at `index`, if it fits in a [`PropagatorId`].
fn slot_id(index: usize) -> Option<PropagatorId> {
    u32::try_from(index).ok().map(PropagatorId)
}
