//! The [`Propagator`] trait.
//!
//! A propagator advances the states of its registered bodies across its
//! configured interval. The shared configuration lives in a
//! [`PropagatorBase`]; implementors expose it through
//! [`base`](Propagator::base) / [`base_mut`](Propagator::base_mut) and
//! supply the advancement logic in [`propagate`](Propagator::propagate).

use orbis_core::{BodyId, PropagatorId, Result, State, TimeValue};

use crate::base::PropagatorBase;
use crate::context::PropagationContext;
use crate::history::History;
use crate::summary::Summary;

/// Advances the states of registered bodies over a time interval.
///
/// # Contract
///
/// `propagate()` must, for every registered body:
///
/// - delegate to the body's nested propagator through
///   [`PropagationContext::delegate`] if one is assigned, or advance the
///   body with the implementor's own method otherwise;
/// - store the final state at the interval end;
/// - store a sample at every fixed-output instant when sampling is enabled;
/// - on failure, return an error and leave no final state behind.
///
/// [`PropagatorBase::drive`] implements all of the above around a
/// segment-advance closure, so most implementations are one call.
///
/// # Object safety
///
/// This trait is object-safe; the registry stores propagators as
/// `Box<dyn Propagator>`.
///
/// # Examples
///
/// A propagator that holds every state constant:
///
/// ```
/// use orbis_core::{BodyId, Result, State};
/// use orbis_propagator::{PropagationContext, Propagator, PropagatorBase};
///
/// struct Frozen {
///     base: PropagatorBase,
/// }
///
/// impl Propagator for Frozen {
///     fn name(&self) -> &str { "frozen" }
///     fn base(&self) -> &PropagatorBase { &self.base }
///     fn base_mut(&mut self) -> &mut PropagatorBase { &mut self.base }
///
///     fn propagate(&mut self, ctx: &mut PropagationContext<'_>) -> Result<()> {
///         self.base.drive("frozen", ctx, |_, state, _, _| Ok(state.clone()))
///     }
/// }
///
/// let mut p = Frozen { base: PropagatorBase::with_interval(0.0, 10.0) };
/// p.add_body(BodyId(0));
/// p.set_initial_state(BodyId(0), State::from([1.0, 2.0])).unwrap();
/// p.propagate_standalone().unwrap();
/// assert_eq!(p.final_state(BodyId(0)).unwrap(), &State::from([1.0, 2.0]));
/// ```
pub trait Propagator: Send + 'static {
    /// Human-readable name for errors, logs and summaries.
    fn name(&self) -> &str;

    /// Shared configuration and results.
    fn base(&self) -> &PropagatorBase;

    /// Mutable access to the shared configuration and results.
    fn base_mut(&mut self) -> &mut PropagatorBase;

    /// Execute one propagation run over every registered body.
    fn propagate(&mut self, ctx: &mut PropagationContext<'_>) -> Result<()>;

    /// Run [`propagate`](Self::propagate) without a registry.
    ///
    /// Bodies with a nested propagator fail with a composition error.
    fn propagate_standalone(&mut self) -> Result<()> {
        self.propagate(&mut PropagationContext::detached())
    }

    /// Set the start of the propagation interval.
    fn set_propagation_interval_start(&mut self, start: TimeValue) {
        self.base_mut().set_propagation_interval_start(start);
    }

    /// Set the end of the propagation interval.
    fn set_propagation_interval_end(&mut self, end: TimeValue) {
        self.base_mut().set_propagation_interval_end(end);
    }

    /// Start of the propagation interval.
    fn propagation_interval_start(&self) -> TimeValue {
        self.base().propagation_interval_start()
    }

    /// End of the propagation interval.
    fn propagation_interval_end(&self) -> TimeValue {
        self.base().propagation_interval_end()
    }

    /// Register a body. Returns `false` if it was already registered.
    fn add_body(&mut self, body: BodyId) -> bool {
        self.base_mut().add_body(body)
    }

    /// Assign a nested propagator to advance `body`.
    fn set_propagator(&mut self, body: BodyId, propagator: PropagatorId) -> Result<()> {
        self.base_mut().set_propagator(body, propagator)
    }

    /// Bind the initial state of `body`.
    fn set_initial_state(&mut self, body: BodyId, state: State) -> Result<()> {
        self.base_mut().set_initial_state(body, state)
    }

    /// Enable history sampling every `interval`; zero disables it.
    fn set_fixed_output_interval(&mut self, interval: TimeValue) -> Result<()> {
        self.base_mut().set_fixed_output_interval(interval)
    }

    /// State of `body` at the interval end, from the latest successful run.
    fn final_state(&self, body: BodyId) -> Result<&State> {
        self.base().final_state(body)
    }

    /// History of `body` sampled during the latest successful run.
    fn propagation_history_at_fixed_output_intervals(&self, body: BodyId) -> Result<&History> {
        self.base().propagation_history_at_fixed_output_intervals(body)
    }

    /// Read-only diagnostic summary of this propagator's configuration.
    fn summary(&self) -> Summary<'_> {
        Summary::new(self.name(), self.base())
    }
}
