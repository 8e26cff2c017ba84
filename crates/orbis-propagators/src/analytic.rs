//! Closed-form propagation.
//!
//! [`AnalyticPropagator`] advances a body by evaluating a solution
//! function `f(state, elapsed)` that maps a state to the state `elapsed`
//! time units later. Each segment between sampling instants is one
//! evaluation, so the solution must be time-invariant (depend only on the
//! elapsed time, not on the absolute epoch).

use orbis_core::{NumericalFailure, Result, State, TimeValue};
use orbis_propagator::{PropagationContext, Propagator, PropagatorBase};

type Solution = Box<dyn Fn(&State, TimeValue) -> State + Send>;

/// Propagates bodies with a closed-form solution.
///
/// ```
/// use orbis_core::{BodyId, State, TimeValue};
/// use orbis_propagator::Propagator;
/// use orbis_propagators::AnalyticPropagator;
///
/// // Uniform motion: [x, v] -> [x + v*dt, v].
/// let mut p = AnalyticPropagator::new("uniform", |s: &State, dt: TimeValue| {
///     State::from([s[0] + s[1] * dt, s[1]])
/// })
/// .with_interval(0.0, 10.0);
/// p.add_body(BodyId(1));
/// p.set_initial_state(BodyId(1), State::from([0.0, 2.0])).unwrap();
/// p.propagate_standalone().unwrap();
/// assert_eq!(p.final_state(BodyId(1)).unwrap(), &State::from([20.0, 2.0]));
/// ```
pub struct AnalyticPropagator {
    name: String,
    base: PropagatorBase,
    solution: Solution,
}

impl AnalyticPropagator {
    /// Create a propagator over `[0, 0]` with sampling disabled.
    pub fn new<F>(name: impl Into<String>, solution: F) -> Self
    where
        F: Fn(&State, TimeValue) -> State + Send + 'static,
    {
        Self {
            name: name.into(),
            base: PropagatorBase::new(),
            solution: Box::new(solution),
        }
    }

    /// Set the propagation interval.
    pub fn with_interval(mut self, start: TimeValue, end: TimeValue) -> Self {
        self.base.set_propagation_interval_start(start);
        self.base.set_propagation_interval_end(end);
        self
    }
}

impl Propagator for AnalyticPropagator {
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
        let solution = &self.solution;
        self.base.drive(name, ctx, |_, state, from, to| {
            let next = solution(state, to - from);
            if next.dim() != state.dim() {
                return Err(NumericalFailure::DimensionMismatch {
                    propagator: name.clone(),
                    expected: state.dim(),
                    actual: next.dim(),
                }
                .into());
            }
            Ok(next)
        })
    }
}
