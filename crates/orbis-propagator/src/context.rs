//! Execution context passed to propagators during a run.
//!
//! [`PropagationContext`] is the only route from a running propagator to
//! its nested propagators. It borrows the [`PropagatorRegistry`] that owns
//! them, so delegation never needs a stored reference to another
//! propagator.

use log::debug;
use orbis_core::{BodyId, CompositionError, PropagatorId, Result, State};

use crate::history::History;
use crate::propagator::Propagator;
use crate::registry::PropagatorRegistry;

/// Result of delegating one body to a nested propagator.
#[derive(Clone, Debug, PartialEq)]
pub struct Delegation {
    /// The nested propagator's final state for the body, at its own interval end.
    pub final_state: State,
    /// The nested propagator's sampled history for the body.
    pub history: History,
}

/// Execution context passed to each propagator's `propagate()` method.
///
/// A context is either attached to a registry (created by
/// [`PropagatorRegistry::propagate`] and by nested delegation) or
/// detached (created with [`detached`](Self::detached) for running a
/// single propagator on its own). Delegation from a detached context
/// fails with [`CompositionError::Detached`].
pub struct PropagationContext<'a> {
    registry: Option<&'a mut PropagatorRegistry>,
    depth: usize,
}

impl<'a> PropagationContext<'a> {
    /// A context with no registry. Bodies can only be advanced locally.
    pub fn detached() -> Self {
        Self {
            registry: None,
            depth: 0,
        }
    }

    pub(crate) fn attached(registry: &'a mut PropagatorRegistry, depth: usize) -> Self {
        Self {
            registry: Some(registry),
            depth,
        }
    }

    /// Nesting depth: 0 for the propagator the run was started on.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns `true` if nested propagators can be reached.
    pub fn is_attached(&self) -> bool {
        self.registry.is_some()
    }

    /// Advance `body` with the nested propagator `id`.
    ///
    /// The body is registered with the nested propagator if needed and,
    /// when `initial` is given, its initial state there is replaced. The
    /// nested propagator then runs synchronously over its own configured
    /// interval, and its final state and history for the body are
    /// returned.
    pub fn delegate(
        &mut self,
        id: PropagatorId,
        body: BodyId,
        initial: Option<State>,
    ) -> Result<Delegation> {
        let depth = self.depth + 1;
        let registry = self
            .registry
            .as_deref_mut()
            .ok_or(CompositionError::Detached { body, id })?;

        let mut nested = registry.take(id)?;
        debug!(
            "delegating body {body} to '{}' ({id}) at depth {depth}",
            nested.name()
        );
        let outcome = run_nested(&mut *nested, registry, depth, body, initial);
        registry.restore(id, nested);
        outcome
    }
}

fn run_nested(
    nested: &mut dyn Propagator,
    registry: &mut PropagatorRegistry,
    depth: usize,
    body: BodyId,
    initial: Option<State>,
) -> Result<Delegation> {
    nested.add_body(body);
    if let Some(state) = initial {
        nested.set_initial_state(body, state)?;
    }

    let mut ctx = PropagationContext::attached(registry, depth);
    nested.propagate(&mut ctx)?;

    Ok(Delegation {
        final_state: nested.final_state(body)?.clone(),
        history: nested
            .propagation_history_at_fixed_output_intervals(body)?
            .clone(),
    })
}
