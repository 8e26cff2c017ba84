//! Configuration and result storage shared by every propagator.
//!
//! [`PropagatorBase`] holds the interval bounds, the sampling interval,
//! and the per-body [`PropagationRecord`]s. Concrete strategies embed one
//! and call [`PropagatorBase::drive`] from their `propagate()`, supplying
//! only the closure that advances a state across one segment.

use indexmap::IndexMap;
use log::{debug, info, trace, warn};
use orbis_core::{
    BodyId, ConfigurationError, NumericalFailure, PropagationError, PropagatorId, Result, State,
    TimeValue,
};

use crate::context::PropagationContext;
use crate::history::History;
use crate::interval::{PropagationInterval, SampleTimes};
use crate::record::PropagationRecord;

/// Interval, sampling and per-body bookkeeping for one propagator.
///
/// # Registration
///
/// Every body-specific setter and getter requires the body to have been
/// registered with [`add_body`](Self::add_body) first; anything else is a
/// [`ConfigurationError::UnregisteredBody`]. Registering twice keeps the
/// existing record.
///
/// # Re-invocation
///
/// Each run recomputes every body from its initial state and replaces all
/// previous results. A failed run clears all results, so queries after a
/// failure report [`PropagationError::NotYetComputed`] instead of returning
/// stale states.
#[derive(Clone, Debug, Default)]
pub struct PropagatorBase {
    interval_start: TimeValue,
    interval_end: TimeValue,
    fixed_output_interval: Option<TimeValue>,
    records: IndexMap<BodyId, PropagationRecord>,
    computed: bool,
}

impl PropagatorBase {
    /// An empty base over `[0, 0]` with sampling disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty base over `[start, end]` with sampling disabled.
    pub fn with_interval(start: TimeValue, end: TimeValue) -> Self {
        Self {
            interval_start: start,
            interval_end: end,
            ..Self::default()
        }
    }

    // ── Interval and sampling ──────────────────────────────────────

    /// Set the start of the propagation interval.
    pub fn set_propagation_interval_start(&mut self, start: TimeValue) {
        self.interval_start = start;
    }

    /// Set the end of the propagation interval.
    pub fn set_propagation_interval_end(&mut self, end: TimeValue) {
        self.interval_end = end;
    }

    /// Start of the propagation interval.
    pub fn propagation_interval_start(&self) -> TimeValue {
        self.interval_start
    }

    /// End of the propagation interval.
    pub fn propagation_interval_end(&self) -> TimeValue {
        self.interval_end
    }

    /// Both bounds as a [`PropagationInterval`].
    pub fn interval(&self) -> PropagationInterval {
        PropagationInterval::new(self.interval_start, self.interval_end)
    }

    /// Enable history sampling every `interval` time units.
    ///
    /// Zero disables sampling. Negative or non-finite values are rejected.
    pub fn set_fixed_output_interval(&mut self, interval: TimeValue) -> Result<()> {
        if !interval.is_finite() || interval < 0.0 {
            warn!("rejected fixed output interval {interval}");
            return Err(ConfigurationError::InvalidOutputInterval { value: interval }.into());
        }
        self.fixed_output_interval = (interval > 0.0).then_some(interval);
        Ok(())
    }

    /// The sampling interval, or `None` if only final states are kept.
    pub fn fixed_output_interval(&self) -> Option<TimeValue> {
        self.fixed_output_interval
    }

    /// Sampling instants for the current configuration.
    ///
    /// Empty when sampling is disabled.
    pub fn sample_times(&self) -> SampleTimes {
        let step = self.fixed_output_interval.unwrap_or(0.0);
        SampleTimes::new(self.interval_start, self.interval_end, step)
    }

    // ── Registration ───────────────────────────────────────────────

    /// Register a body.
    ///
    /// Returns `false` if it was already registered; its record is left
    /// untouched in that case.
    pub fn add_body(&mut self, body: BodyId) -> bool {
        if self.records.contains_key(&body) {
            return false;
        }
        debug!("registered body {body}");
        self.records.insert(body, PropagationRecord::new(body));
        true
    }

    /// Unregister a body, dropping its states and history.
    pub fn remove_body(&mut self, body: BodyId) -> Result<PropagationRecord> {
        self.records
            .shift_remove(&body)
            .ok_or_else(|| ConfigurationError::UnregisteredBody { body }.into())
    }

    /// Returns `true` if the body is registered.
    pub fn contains_body(&self, body: BodyId) -> bool {
        self.records.contains_key(&body)
    }

    /// Number of registered bodies.
    pub fn body_count(&self) -> usize {
        self.records.len()
    }

    /// Registered bodies in registration order.
    pub fn bodies(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.records.keys().copied()
    }

    /// Records in registration order.
    pub fn records(&self) -> impl Iterator<Item = &PropagationRecord> + '_ {
        self.records.values()
    }

    /// The record for a registered body.
    pub fn record(&self, body: BodyId) -> Result<&PropagationRecord> {
        self.records
            .get(&body)
            .ok_or_else(|| ConfigurationError::UnregisteredBody { body }.into())
    }

    fn record_mut(&mut self, body: BodyId) -> Result<&mut PropagationRecord> {
        self.records
            .get_mut(&body)
            .ok_or_else(|| ConfigurationError::UnregisteredBody { body }.into())
    }

    /// Assign a nested propagator to advance `body`.
    pub fn set_propagator(&mut self, body: BodyId, propagator: PropagatorId) -> Result<()> {
        self.record_mut(body)?.set_propagator(Some(propagator));
        debug!("body {body} delegated to propagator {propagator}");
        Ok(())
    }

    /// Remove the nested propagator from `body`, returning it to local advancement.
    pub fn clear_propagator(&mut self, body: BodyId) -> Result<Option<PropagatorId>> {
        let record = self.record_mut(body)?;
        let previous = record.propagator();
        record.set_propagator(None);
        Ok(previous)
    }

    /// Bind the initial state of `body`. The base takes ownership.
    pub fn set_initial_state(&mut self, body: BodyId, state: State) -> Result<()> {
        self.record_mut(body)?.set_initial_state(state);
        Ok(())
    }

    // ── Results ────────────────────────────────────────────────────

    /// Returns `true` once a run has completed successfully.
    pub fn is_computed(&self) -> bool {
        self.computed
    }

    /// State of `body` at the end of the latest successful run.
    pub fn final_state(&self, body: BodyId) -> Result<&State> {
        let record = self.record(body)?;
        if !self.computed {
            return Err(PropagationError::NotYetComputed { body });
        }
        record
            .final_state()
            .ok_or(PropagationError::NotYetComputed { body })
    }

    /// History of `body` sampled during the latest successful run.
    ///
    /// Empty when sampling was disabled for that run.
    pub fn propagation_history_at_fixed_output_intervals(&self, body: BodyId) -> Result<&History> {
        let record = self.record(body)?;
        if !self.computed {
            return Err(PropagationError::NotYetComputed { body });
        }
        Ok(record.history())
    }

    /// Append a sample to the history of `body` during a run.
    ///
    /// For strategies that implement `propagate()` without
    /// [`drive`](Self::drive).
    pub fn record_sample(&mut self, body: BodyId, time: TimeValue, state: State) -> Result<()> {
        self.record_mut(body)?
            .push_sample(time, state)
            .map_err(|last| ConfigurationError::NonMonotonicHistory { body, time, last }.into())
    }

    /// Store the final state of `body` during a run.
    ///
    /// For strategies that implement `propagate()` without
    /// [`drive`](Self::drive).
    pub fn store_final_state(&mut self, body: BodyId, state: State) -> Result<()> {
        self.record_mut(body)?.set_final_state(state);
        Ok(())
    }

    /// Validate the interval and sampling step and drop the previous run's results.
    pub fn begin_run(&mut self) -> Result<()> {
        self.computed = false;
        for record in self.records.values_mut() {
            record.clear_result();
        }
        self.interval().validate()?;
        if let Some(step) = self.fixed_output_interval {
            if !self.interval().resolves_step(step) {
                return Err(ConfigurationError::InvalidOutputInterval { value: step }.into());
            }
        }
        Ok(())
    }

    /// Mark the current run as successful.
    ///
    /// Fails with [`PropagationError::NotYetComputed`] for the first body
    /// left without a final state; all results are cleared in that case.
    pub fn finish_run(&mut self) -> Result<()> {
        if let Some(body) = self
            .records
            .values()
            .find(|r| r.final_state().is_none())
            .map(PropagationRecord::body)
        {
            self.abort_run();
            return Err(PropagationError::NotYetComputed { body });
        }
        self.computed = true;
        Ok(())
    }

    /// Discard everything the current run produced.
    pub fn abort_run(&mut self) {
        self.computed = false;
        for record in self.records.values_mut() {
            record.clear_result();
        }
    }

    // ── Orchestration ──────────────────────────────────────────────

    /// Run one propagation over every registered body.
    ///
    /// For each body, in registration order:
    ///
    /// - if a nested propagator is assigned, the run is delegated through
    ///   `ctx` and the nested propagator's final state for the body is
    ///   copied back. Its history is copied too when this base samples;
    ///   with sampling disabled the body's history stays empty;
    /// - otherwise `advance(body, state, from, to)` is called once per
    ///   segment between consecutive sampling instants (or once over the
    ///   whole interval when sampling is disabled).
    ///
    /// Every state returned by `advance` is checked for NaN/infinite
    /// components. Any error aborts the run and clears all results.
    pub fn drive<F>(&mut self, name: &str, ctx: &mut PropagationContext<'_>, mut advance: F) -> Result<()>
    where
        F: FnMut(BodyId, &State, TimeValue, TimeValue) -> Result<State>,
    {
        self.begin_run()?;
        match self.drive_records(name, ctx, &mut advance) {
            Ok(()) => {
                self.finish_run()?;
                info!(
                    "'{name}' propagated {} bodies over [{}, {}]",
                    self.records.len(),
                    self.interval_start,
                    self.interval_end
                );
                Ok(())
            }
            Err(e) => {
                self.abort_run();
                warn!("'{name}' propagation failed: {e}");
                Err(e)
            }
        }
    }

    fn drive_records<F>(&mut self, name: &str, ctx: &mut PropagationContext<'_>, advance: &mut F) -> Result<()>
    where
        F: FnMut(BodyId, &State, TimeValue, TimeValue) -> Result<State>,
    {
        let bodies: Vec<BodyId> = self.records.keys().copied().collect();
        for body in bodies {
            let record = &self.records[&body];
            let initial = record.initial_state().cloned();
            let (final_state, history) = match record.propagator() {
                Some(id) => {
                    let delegation = ctx.delegate(id, body, initial)?;
                    let history = match self.fixed_output_interval {
                        Some(_) => delegation.history,
                        None => History::new(),
                    };
                    (delegation.final_state, history)
                }
                None => {
                    let initial =
                        initial.ok_or(ConfigurationError::MissingInitialState { body })?;
                    self.advance_locally(name, body, initial, advance)?
                }
            };
            self.records[&body].set_result(final_state, history);
        }
        Ok(())
    }

    fn advance_locally<F>(
        &self,
        name: &str,
        body: BodyId,
        initial: State,
        advance: &mut F,
    ) -> Result<(State, History)>
    where
        F: FnMut(BodyId, &State, TimeValue, TimeValue) -> Result<State>,
    {
        let mut history = History::new();
        let mut time = self.interval_start;
        let mut state = initial;

        for sample in self.sample_times() {
            if sample > time {
                state = checked(name, body, sample, advance(body, &state, time, sample)?)?;
                time = sample;
            }
            trace!("body {body} sampled at t={sample}");
            history
                .push(sample, state.clone())
                .map_err(|last| ConfigurationError::NonMonotonicHistory {
                    body,
                    time: sample,
                    last,
                })?;
        }

        if self.interval_end > time {
            state = checked(
                name,
                body,
                self.interval_end,
                advance(body, &state, time, self.interval_end)?,
            )?;
        }
        Ok((state, history))
    }
}

fn checked(name: &str, body: BodyId, time: TimeValue, state: State) -> Result<State> {
    match state.first_non_finite() {
        None => Ok(state),
        Some(component) => Err(NumericalFailure::NonFiniteState {
            propagator: name.to_string(),
            body,
            time,
            component,
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: BodyId = BodyId(1);
    const B: BodyId = BodyId(2);

    /// Advances every component by the elapsed time.
    fn drift(_: BodyId, s: &State, from: TimeValue, to: TimeValue) -> Result<State> {
        Ok(s.iter().map(|v| v + (to - from)).collect())
    }

    fn run(base: &mut PropagatorBase) -> Result<()> {
        base.drive("drift", &mut PropagationContext::detached(), drift)
    }

    #[test]
    fn unregistered_body_is_a_configuration_error() {
        let mut base = PropagatorBase::new();
        let c = BodyId(99);
        assert!(base.set_initial_state(c, State::from([0.0])).unwrap_err().is_configuration());
        assert!(base.set_propagator(c, PropagatorId(0)).unwrap_err().is_configuration());
        assert!(base.final_state(c).unwrap_err().is_configuration());
        assert!(base
            .propagation_history_at_fixed_output_intervals(c)
            .unwrap_err()
            .is_configuration());
        assert!(base.remove_body(c).unwrap_err().is_configuration());
        assert!(!base.contains_body(c));
    }

    #[test]
    fn re_adding_keeps_record() {
        let mut base = PropagatorBase::new();
        assert!(base.add_body(A));
        base.set_initial_state(A, State::from([1.0])).unwrap();
        assert!(!base.add_body(A));
        assert_eq!(base.body_count(), 1);
        assert_eq!(base.record(A).unwrap().initial_state(), Some(&State::from([1.0])));
    }

    #[test]
    fn queries_before_run_are_not_yet_computed() {
        let mut base = PropagatorBase::with_interval(0.0, 1.0);
        base.add_body(A);
        base.set_initial_state(A, State::from([0.0])).unwrap();
        assert!(base.final_state(A).unwrap_err().is_not_yet_computed());
        assert!(base
            .propagation_history_at_fixed_output_intervals(A)
            .unwrap_err()
            .is_not_yet_computed());
    }

    #[test]
    fn no_sampling_keeps_final_state_only() {
        let mut base = PropagatorBase::with_interval(0.0, 100.0);
        base.add_body(A);
        base.set_initial_state(A, State::from([0.0])).unwrap();
        run(&mut base).unwrap();
        assert_eq!(base.final_state(A).unwrap(), &State::from([100.0]));
        assert!(base.propagation_history_at_fixed_output_intervals(A).unwrap().is_empty());
    }

    #[test]
    fn sampling_fills_history() {
        let mut base = PropagatorBase::with_interval(0.0, 100.0);
        base.set_fixed_output_interval(25.0).unwrap();
        base.add_body(A);
        base.set_initial_state(A, State::from([0.0])).unwrap();
        run(&mut base).unwrap();

        let history = base.propagation_history_at_fixed_output_intervals(A).unwrap();
        assert_eq!(history.times().collect::<Vec<_>>(), vec![0.0, 25.0, 50.0, 75.0, 100.0]);
        for (t, s) in history {
            assert_eq!(s[0], t);
        }
        assert_eq!(base.final_state(A).unwrap(), &State::from([100.0]));
    }

    #[test]
    fn off_grid_end_still_reaches_end() {
        let mut base = PropagatorBase::with_interval(0.0, 10.0);
        base.set_fixed_output_interval(4.0).unwrap();
        base.add_body(A);
        base.set_initial_state(A, State::from([0.0])).unwrap();
        run(&mut base).unwrap();
        let history = base.propagation_history_at_fixed_output_intervals(A).unwrap();
        assert_eq!(history.times().collect::<Vec<_>>(), vec![0.0, 4.0, 8.0]);
        assert_eq!(base.final_state(A).unwrap(), &State::from([10.0]));
    }

    #[test]
    fn zero_output_interval_disables_sampling() {
        let mut base = PropagatorBase::new();
        base.set_fixed_output_interval(5.0).unwrap();
        assert_eq!(base.fixed_output_interval(), Some(5.0));
        base.set_fixed_output_interval(0.0).unwrap();
        assert_eq!(base.fixed_output_interval(), None);
        assert_eq!(base.sample_times().count(), 0);
    }

    #[test]
    fn invalid_output_interval_rejected() {
        let mut base = PropagatorBase::new();
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let err = base.set_fixed_output_interval(bad).unwrap_err();
            assert!(matches!(
                err,
                PropagationError::Configuration(ConfigurationError::InvalidOutputInterval { .. })
            ));
        }
    }

    #[test]
    fn reversed_interval_rejected_at_run() {
        let mut base = PropagatorBase::with_interval(10.0, 0.0);
        base.add_body(A);
        base.set_initial_state(A, State::from([0.0])).unwrap();
        let err = run(&mut base).unwrap_err();
        assert!(matches!(
            err,
            PropagationError::Configuration(ConfigurationError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn unresolvable_output_interval_rejected_at_run() {
        let mut base = PropagatorBase::with_interval(1e16, 1e16 + 8.0);
        base.set_fixed_output_interval(1.0).unwrap();
        base.add_body(A);
        base.set_initial_state(A, State::from([0.0])).unwrap();
        assert_eq!(
            run(&mut base).unwrap_err(),
            PropagationError::from(ConfigurationError::InvalidOutputInterval { value: 1.0 })
        );

        base.set_fixed_output_interval(2.0).unwrap();
        run(&mut base).unwrap();
        let times: Vec<_> = base
            .propagation_history_at_fixed_output_intervals(A)
            .unwrap()
            .times()
            .collect();
        assert_eq!(times.len(), 5);
        assert_eq!(times[4], 1e16 + 8.0);
    }

    #[test]
    fn missing_initial_state_fails_run() {
        let mut base = PropagatorBase::with_interval(0.0, 1.0);
        base.add_body(A);
        let err = run(&mut base).unwrap_err();
        assert_eq!(
            err,
            PropagationError::from(ConfigurationError::MissingInitialState { body: A })
        );
    }

    #[test]
    fn non_finite_state_fails_and_clears_results() {
        let mut base = PropagatorBase::with_interval(0.0, 2.0);
        base.add_body(A);
        base.add_body(B);
        base.set_initial_state(A, State::from([0.0])).unwrap();
        base.set_initial_state(B, State::from([0.0])).unwrap();
        run(&mut base).unwrap();
        assert!(base.is_computed());

        let err = base
            .drive("nan", &mut PropagationContext::detached(), |body, s, _, _| {
                if body == B {
                    Ok(State::from([f64::NAN]))
                } else {
                    Ok(s.clone())
                }
            })
            .unwrap_err();
        assert!(err.is_numerical());
        assert!(!base.is_computed());
        assert!(base.final_state(A).unwrap_err().is_not_yet_computed());
    }

    #[test]
    fn rerun_replaces_results() {
        let mut base = PropagatorBase::with_interval(0.0, 1.0);
        base.add_body(A);
        base.set_initial_state(A, State::from([0.0])).unwrap();
        run(&mut base).unwrap();
        assert_eq!(base.final_state(A).unwrap()[0], 1.0);

        base.set_propagation_interval_end(3.0);
        run(&mut base).unwrap();
        assert_eq!(base.final_state(A).unwrap()[0], 3.0);
    }

    #[test]
    fn zero_length_interval_returns_initial_state() {
        let mut base = PropagatorBase::with_interval(4.0, 4.0);
        base.set_fixed_output_interval(1.0).unwrap();
        base.add_body(A);
        base.set_initial_state(A, State::from([7.0])).unwrap();
        run(&mut base).unwrap();
        assert_eq!(base.final_state(A).unwrap(), &State::from([7.0]));
        let history = base.propagation_history_at_fixed_output_intervals(A).unwrap();
        assert_eq!(history.times().collect::<Vec<_>>(), vec![4.0]);
    }

    #[test]
    fn manual_result_storage() {
        let mut base = PropagatorBase::with_interval(0.0, 2.0);
        base.add_body(A);
        base.begin_run().unwrap();
        base.record_sample(A, 0.0, State::from([0.0])).unwrap();
        base.record_sample(A, 1.0, State::from([1.0])).unwrap();
        let err = base.record_sample(A, 1.0, State::from([1.0])).unwrap_err();
        assert!(matches!(
            err,
            PropagationError::Configuration(ConfigurationError::NonMonotonicHistory { .. })
        ));
        base.store_final_state(A, State::from([2.0])).unwrap();
        base.finish_run().unwrap();
        assert_eq!(base.propagation_history_at_fixed_output_intervals(A).unwrap().len(), 2);
        assert_eq!(base.final_state(A).unwrap(), &State::from([2.0]));
    }

    #[test]
    fn finish_run_requires_every_final_state() {
        let mut base = PropagatorBase::with_interval(0.0, 1.0);
        base.add_body(A);
        base.add_body(B);
        base.begin_run().unwrap();
        base.store_final_state(A, State::from([1.0])).unwrap();
        assert_eq!(
            base.finish_run().unwrap_err(),
            PropagationError::NotYetComputed { body: B }
        );
        assert!(base.final_state(A).unwrap_err().is_not_yet_computed());
    }

    #[test]
    fn remove_body_drops_record() {
        let mut base = PropagatorBase::new();
        base.add_body(A);
        base.add_body(B);
        let removed = base.remove_body(A).unwrap();
        assert_eq!(removed.body(), A);
        assert_eq!(base.bodies().collect::<Vec<_>>(), vec![B]);
    }

    #[test]
    fn clearing_a_delegate_makes_the_body_local_again() {
        let mut base = PropagatorBase::with_interval(0.0, 2.0);
        base.add_body(A);
        base.set_initial_state(A, State::from([1.0])).unwrap();
        base.set_propagator(A, PropagatorId(7)).unwrap();
        assert!(run(&mut base).unwrap_err().is_composition());

        assert_eq!(base.clear_propagator(A).unwrap(), Some(PropagatorId(7)));
        assert_eq!(base.clear_propagator(A).unwrap(), None);
        run(&mut base).unwrap();
        assert_eq!(base.final_state(A).unwrap(), &State::from([3.0]));
    }
}
