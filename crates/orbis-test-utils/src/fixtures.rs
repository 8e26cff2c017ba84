//! Reusable propagator test fixtures.
//!
//! - [`ConstantVelocity`]: closed-form uniform motion of `[x.., v..]` states.
//! - [`CountingPropagator`]: holds states constant and counts its runs.
//! - [`FailingPropagator`]: fails deterministically after N successful runs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use orbis_core::{NumericalFailure, Result, State, TimeValue};
use orbis_propagator::{PropagationContext, Propagator, PropagatorBase};

/// Uniform motion: the first half of the state is position, the second
/// half velocity, and positions advance by `velocity * dt`.
///
/// A state of odd dimension is rejected with a dimension mismatch.
pub struct ConstantVelocity {
    pub name: String,
    base: PropagatorBase,
}

impl ConstantVelocity {
    pub fn new(name: impl Into<String>, start: TimeValue, end: TimeValue) -> Self {
        Self {
            name: name.into(),
            base: PropagatorBase::with_interval(start, end),
        }
    }

    /// The closed-form solution, exposed for reference values in tests.
    pub fn advance(state: &State, dt: TimeValue) -> State {
        let half = state.dim() / 2;
        let (pos, vel) = state.as_slice().split_at(half);
        pos.iter()
            .zip(vel)
            .map(|(x, v)| x + v * dt)
            .chain(vel.iter().copied())
            .collect()
    }
}

impl Propagator for ConstantVelocity {
    fn name(&self) -> &str {
        &self.name
    }

    fn base(&self) -> &PropagatorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PropagatorBase {
        &mut self.base
    }

    fn propagate(&mut self, ctx: &mut PropagationContext<'_>) -> Result<()> {
        let name = &self.name;
        self.base.drive(name, ctx, |_, state, from, to| {
            if state.dim() % 2 != 0 {
                return Err(NumericalFailure::DimensionMismatch {
                    propagator: name.clone(),
                    expected: state.dim() + 1,
                    actual: state.dim(),
                }
                .into());
            }
            Ok(Self::advance(state, to - from))
        })
    }
}

/// Shared handle onto a fixture's run counter.
///
/// Stays readable after the fixture has been moved into a registry.
#[derive(Clone, Debug, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    /// How many times `propagate()` has been called.
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    /// Reset the counter.
    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }

    fn bump(&self) -> usize {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// Holds every state constant and counts `propagate()` calls.
///
/// Useful for checking how often a shared nested propagator is run.
pub struct CountingPropagator {
    pub name: String,
    base: PropagatorBase,
    calls: CallCounter,
}

impl CountingPropagator {
    pub fn new(name: impl Into<String>, start: TimeValue, end: TimeValue) -> Self {
        Self {
            name: name.into(),
            base: PropagatorBase::with_interval(start, end),
            calls: CallCounter::default(),
        }
    }

    /// A handle onto the run counter.
    pub fn counter(&self) -> CallCounter {
        self.calls.clone()
    }
}

impl Propagator for CountingPropagator {
    fn name(&self) -> &str {
        &self.name
    }

    fn base(&self) -> &PropagatorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PropagatorBase {
        &mut self.base
    }

    fn propagate(&mut self, ctx: &mut PropagationContext<'_>) -> Result<()> {
        self.calls.bump();
        self.base
            .drive(&self.name, ctx, |_, state, _, _| Ok(state.clone()))
    }
}

/// Fails deterministically after a configurable number of successful runs.
///
/// Successful runs hold every state constant. Failed runs report
/// [`NumericalFailure::Diverged`] and leave no results behind.
pub struct FailingPropagator {
    pub name: String,
    pub succeed_count: usize,
    base: PropagatorBase,
    calls: CallCounter,
}

impl FailingPropagator {
    /// Create a propagator that succeeds `succeed_count` times then fails.
    pub fn new(
        name: impl Into<String>,
        start: TimeValue,
        end: TimeValue,
        succeed_count: usize,
    ) -> Self {
        Self {
            name: name.into(),
            succeed_count,
            base: PropagatorBase::with_interval(start, end),
            calls: CallCounter::default(),
        }
    }

    /// A handle onto the run counter.
    pub fn counter(&self) -> CallCounter {
        self.calls.clone()
    }
}

impl Propagator for FailingPropagator {
    fn name(&self) -> &str {
        &self.name
    }

    fn base(&self) -> &PropagatorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PropagatorBase {
        &mut self.base
    }

    fn propagate(&mut self, ctx: &mut PropagationContext<'_>) -> Result<()> {
        let n = self.calls.bump();
        let succeed_count = self.succeed_count;
        let name = &self.name;
        self.base.drive(name, ctx, |_, state, _, _| {
            if n >= succeed_count {
                return Err(NumericalFailure::Diverged {
                    propagator: name.clone(),
                    reason: format!("deliberate failure after {succeed_count} successful runs"),
                }
                .into());
            }
            Ok(state.clone())
        })
    }
}
