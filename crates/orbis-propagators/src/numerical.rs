//! Fixed-step numerical integration of a dynamics model.
//!
//! [`NumericalPropagator`] advances each locally-propagated body by
//! integrating a [`StateDerivative`] with a fixed step. Each segment
//! between sampling instants is covered by whole steps, and the last
//! step of a segment is shortened so it lands exactly on the segment end.
//!
//! # Integrators
//!
//! | [`Integrator`] | Order | Derivative evaluations per step |
//! |----------------|-------|---------------------------------|
//! | `Euler`        | 1     | 1                               |
//! | `Rk4`          | 4     | 4                               |
//!
//! # Construction
//!
//! ```
//! use orbis_core::{State, TimeValue};
//! use orbis_propagators::{Integrator, NumericalPropagator};
//!
//! // dx/dt = -x
//! let decay = |_: TimeValue, s: &State| s.iter().map(|v| -v).collect::<State>();
//! let prop = NumericalPropagator::new(decay, Integrator::Rk4, 0.01).unwrap();
//! assert_eq!(prop.step_size(), 0.01);
//! ```

use log::trace;
use orbis_core::{BodyId, NumericalFailure, Result, State, TimeValue};
use orbis_propagator::{PropagationContext, Propagator, PropagatorBase};

/// Relative slack below which a trailing partial step is dropped.
const STEP_COUNT_TOLERANCE: f64 = 1e-9;

/// Time derivative `dy/dt = f(t, y)` of a body's state.
///
/// Implemented for every `Fn(TimeValue, &State) -> State` closure that is
/// `Send + 'static`.
pub trait StateDerivative: Send + 'static {
    /// Evaluate the derivative of `state` at `time`.
    ///
    /// The result must have the same dimension as `state`.
    fn derivative(&self, time: TimeValue, state: &State) -> State;
}

impl<F> StateDerivative for F
where
    F: Fn(TimeValue, &State) -> State + Send + 'static,
{
    fn derivative(&self, time: TimeValue, state: &State) -> State {
        self(time, state)
    }
}

/// Fixed-step integration scheme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Integrator {
    /// Explicit Euler.
    Euler,
    /// Classic fourth-order Runge-Kutta.
    #[default]
    Rk4,
}

impl Integrator {
    /// Short lowercase name, also used as the default propagator name.
    pub fn name(self) -> &'static str {
        match self {
            Integrator::Euler => "euler",
            Integrator::Rk4 => "rk4",
        }
    }

    /// Order of accuracy.
    pub fn order(self) -> u8 {
        match self {
            Integrator::Euler => 1,
            Integrator::Rk4 => 4,
        }
    }

    /// Derivative evaluations per step.
    pub fn stages(self) -> usize {
        match self {
            Integrator::Euler => 1,
            Integrator::Rk4 => 4,
        }
    }

    fn step(
        self,
        model: &Evaluator<'_>,
        time: TimeValue,
        state: &State,
        h: f64,
    ) -> Result<State> {
        match self {
            Integrator::Euler => {
                let k1 = model.eval(time, state)?;
                Ok(state.add_scaled(&k1, h))
            }
            Integrator::Rk4 => {
                let half = 0.5 * h;
                let k1 = model.eval(time, state)?;
                let k2 = model.eval(time + half, &state.add_scaled(&k1, half))?;
                let k3 = model.eval(time + half, &state.add_scaled(&k2, half))?;
                let k4 = model.eval(time + h, &state.add_scaled(&k3, h))?;
                Ok(state
                    .add_scaled(&k1, h / 6.0)
                    .add_scaled(&k2, h / 3.0)
                    .add_scaled(&k3, h / 3.0)
                    .add_scaled(&k4, h / 6.0))
            }
        }
    }
}

/// Derivative model bound to a propagator name for error reporting.
struct Evaluator<'a> {
    name: &'a str,
    model: &'a dyn StateDerivative,
}

impl Evaluator<'_> {
    fn eval(&self, time: TimeValue, state: &State) -> Result<State> {
        let k = self.model.derivative(time, state);
        if k.dim() != state.dim() {
            return Err(NumericalFailure::DimensionMismatch {
                propagator: self.name.to_string(),
                expected: state.dim(),
                actual: k.dim(),
            }
            .into());
        }
        if let Some(component) = k.first_non_finite() {
            return Err(NumericalFailure::Diverged {
                propagator: self.name.to_string(),
                reason: format!("derivative component {component} is not finite at t={time}"),
            }
            .into());
        }
        Ok(k)
    }
}

/// Propagates bodies by integrating a [`StateDerivative`] with a fixed step.
pub struct NumericalPropagator {
    name: String,
    base: PropagatorBase,
    model: Box<dyn StateDerivative>,
    integrator: Integrator,
    step_size: f64,
}

impl NumericalPropagator {
    /// Create a propagator over `[0, 0]` with sampling disabled.
    ///
    /// # Errors
    ///
    /// Returns [`NumericalFailure::InvalidStepSize`] if `step_size` is not
    /// finite and positive.
    pub fn new(
        model: impl StateDerivative,
        integrator: Integrator,
        step_size: f64,
    ) -> Result<Self> {
        let name = integrator.name().to_string();
        check_step(&name, step_size)?;
        Ok(Self {
            name,
            base: PropagatorBase::new(),
            model: Box::new(model),
            integrator,
            step_size,
        })
    }

    /// Replace the name used in errors, logs and summaries.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the propagation interval.
    pub fn with_interval(mut self, start: TimeValue, end: TimeValue) -> Self {
        self.base.set_propagation_interval_start(start);
        self.base.set_propagation_interval_end(end);
        self
    }

    /// The integration scheme.
    pub fn integrator(&self) -> Integrator {
        self.integrator
    }

    /// Select a different integration scheme.
    pub fn set_integrator(&mut self, integrator: Integrator) {
        self.integrator = integrator;
    }

    /// The nominal step size.
    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// Change the nominal step size.
    pub fn set_step_size(&mut self, step_size: f64) -> Result<()> {
        check_step(&self.name, step_size)?;
        self.step_size = step_size;
        Ok(())
    }
}

fn check_step(name: &str, step: f64) -> Result<()> {
    if step.is_finite() && step > 0.0 {
        Ok(())
    } else {
        Err(NumericalFailure::InvalidStepSize {
            propagator: name.to_string(),
            step,
        }
        .into())
    }
}

/// Integrate from `from` to `to` in steps of at most `step`.
fn integrate(
    integrator: Integrator,
    model: &Evaluator<'_>,
    body: BodyId,
    state: &State,
    from: TimeValue,
    to: TimeValue,
    step: f64,
) -> Result<State> {
    let span = to - from;
    let steps = ((span / step) - STEP_COUNT_TOLERANCE).ceil().max(1.0) as u64;
    trace!("body {body}: {steps} {} steps over [{from}, {to}]", integrator.name());

    let mut y = state.clone();
    for k in 0..steps {
        let t = from + k as f64 * step;
        let t_next = if k + 1 == steps { to } else { t + step };
        y = integrator.step(model, t, &y, t_next - t)?;
    }
    Ok(y)
}

impl Propagator for NumericalPropagator {
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
        check_step(&self.name, self.step_size)?;
        let evaluator = Evaluator {
            name: &self.name,
            model: self.model.as_ref(),
        };
        let integrator = self.integrator;
        let step = self.step_size;
        self.base.drive(&self.name, ctx, |body, state, from, to| {
            integrate(integrator, &evaluator, body, state, from, to, step)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_core::PropagationError;
    use proptest::prelude::*;

    const BODY: BodyId = BodyId(0);

    fn decay(_: TimeValue, s: &State) -> State {
        s.iter().map(|v| -v).collect()
    }

    fn run(integrator: Integrator, step: f64, end: f64) -> State {
        let mut p = NumericalPropagator::new(decay, integrator, step)
            .unwrap()
            .with_interval(0.0, end);
        p.add_body(BODY);
        p.set_initial_state(BODY, State::from([1.0])).unwrap();
        p.propagate_standalone().unwrap();
        p.final_state(BODY).unwrap().clone()
    }

    #[test]
    fn rejects_bad_step_sizes() {
        for step in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = NumericalPropagator::new(decay, Integrator::Euler, step)
                .err()
                .unwrap();
            assert!(err.is_numerical(), "step {step} accepted");
        }
    }

    #[test]
    fn set_step_size_keeps_old_value_on_error() {
        let mut p = NumericalPropagator::new(decay, Integrator::Rk4, 0.1).unwrap();
        assert!(p.set_step_size(-0.5).is_err());
        assert_eq!(p.step_size(), 0.1);
        p.set_step_size(0.2).unwrap();
        assert_eq!(p.step_size(), 0.2);
    }

    #[test]
    fn rk4_matches_exponential_decay() {
        let y = run(Integrator::Rk4, 0.01, 1.0);
        assert!((y[0] - (-1.0f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn euler_is_first_order() {
        let coarse = (run(Integrator::Euler, 0.01, 1.0)[0] - (-1.0f64).exp()).abs();
        let fine = (run(Integrator::Euler, 0.005, 1.0)[0] - (-1.0f64).exp()).abs();
        let ratio = coarse / fine;
        assert!((1.8..2.2).contains(&ratio), "ratio {ratio}");
    }

    #[test]
    fn last_step_is_truncated_to_interval_end() {
        // 0.3 is not a multiple of 0.25; a linear model is integrated exactly.
        let mut p = NumericalPropagator::new(
            |_: TimeValue, _: &State| State::from([1.0]),
            Integrator::Euler,
            0.25,
        )
        .unwrap()
        .with_interval(0.0, 0.3);
        p.add_body(BODY);
        p.set_initial_state(BODY, State::from([0.0])).unwrap();
        p.propagate_standalone().unwrap();
        assert!((p.final_state(BODY).unwrap()[0] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn time_dependent_model_sees_absolute_time() {
        // dy/dt = 2t from t=1 to t=3 gives y(3) - y(1) = 8.
        let mut p = NumericalPropagator::new(
            |t: TimeValue, _: &State| State::from([2.0 * t]),
            Integrator::Rk4,
            0.5,
        )
        .unwrap()
        .with_interval(1.0, 3.0);
        p.set_fixed_output_interval(0.5).unwrap();
        p.add_body(BODY);
        p.set_initial_state(BODY, State::from([0.0])).unwrap();
        p.propagate_standalone().unwrap();
        assert!((p.final_state(BODY).unwrap()[0] - 8.0).abs() < 1e-12);
        let times: Vec<_> = p
            .propagation_history_at_fixed_output_intervals(BODY)
            .unwrap()
            .times()
            .collect();
        assert_eq!(times, vec![1.0, 1.5, 2.0, 2.5, 3.0]);
    }

    #[test]
    fn wrong_derivative_dimension_fails_the_run() {
        let mut p = NumericalPropagator::new(
            |_: TimeValue, _: &State| State::zeros(2),
            Integrator::Rk4,
            0.1,
        )
        .unwrap()
        .with_interval(0.0, 1.0);
        p.add_body(BODY);
        p.set_initial_state(BODY, State::from([1.0, 2.0, 3.0])).unwrap();
        let err = p.propagate_standalone().unwrap_err();
        assert_eq!(
            err,
            PropagationError::from(NumericalFailure::DimensionMismatch {
                propagator: "rk4".into(),
                expected: 3,
                actual: 2,
            })
        );
        assert!(p.final_state(BODY).unwrap_err().is_not_yet_computed());
    }

    #[test]
    fn non_finite_derivative_reports_divergence() {
        let mut p = NumericalPropagator::new(
            |_: TimeValue, s: &State| -> State { s.iter().map(|v| 1.0 / (v - 1.0)).collect() },
            Integrator::Euler,
            0.1,
        )
        .unwrap()
        .with_name("singular")
        .with_interval(0.0, 1.0);
        p.add_body(BODY);
        p.set_initial_state(BODY, State::from([1.0])).unwrap();
        let err = p.propagate_standalone().unwrap_err();
        assert!(matches!(
            err,
            PropagationError::Numerical(NumericalFailure::Diverged { ref propagator, .. })
                if propagator == "singular"
        ));
    }

    #[test]
    fn integrator_metadata() {
        assert_eq!(Integrator::default(), Integrator::Rk4);
        assert_eq!(Integrator::Rk4.order(), 4);
        assert_eq!(Integrator::Rk4.stages(), 4);
        assert_eq!(Integrator::Euler.order(), 1);
        assert_eq!(Integrator::Euler.name(), "euler");
    }

    proptest! {
        #[test]
        fn constant_derivative_is_integrated_exactly(
            rate in -10.0f64..10.0,
            end in 0.0f64..50.0,
            step in 0.01f64..5.0,
            euler in any::<bool>(),
        ) {
            let integrator = if euler { Integrator::Euler } else { Integrator::Rk4 };
            let mut p = NumericalPropagator::new(
                move |_: TimeValue, _: &State| State::from([rate]),
                integrator,
                step,
            )
            .unwrap()
            .with_interval(0.0, end);
            p.add_body(BODY);
            p.set_initial_state(BODY, State::from([1.0])).unwrap();
            p.propagate_standalone().unwrap();
            let y = p.final_state(BODY).unwrap()[0];
            prop_assert!((y - (1.0 + rate * end)).abs() <= 1e-9 * (1.0 + (rate * end).abs()));
        }
    }
}
