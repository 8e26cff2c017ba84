//! Per-body propagation record.

use orbis_core::{BodyId, PropagatorId, State, TimeValue};

use crate::history::History;

/// Everything a propagator knows about one registered body.
///
/// The body and the nested propagator are referenced by id only; the
/// states and the history are owned and dropped with the record.
#[derive(Clone, Debug, PartialEq)]
pub struct PropagationRecord {
    body: BodyId,
    initial_state: Option<State>,
    propagator: Option<PropagatorId>,
    final_state: Option<State>,
    history: History,
}

impl PropagationRecord {
    /// A fresh record with nothing bound yet.
    pub fn new(body: BodyId) -> Self {
        Self {
            body,
            initial_state: None,
            propagator: None,
            final_state: None,
            history: History::new(),
        }
    }

    /// The body this record describes.
    pub fn body(&self) -> BodyId {
        self.body
    }

    /// Initial state, if one was set.
    pub fn initial_state(&self) -> Option<&State> {
        self.initial_state.as_ref()
    }

    /// Nested propagator responsible for this body, if any.
    pub fn propagator(&self) -> Option<PropagatorId> {
        self.propagator
    }

    /// Returns `true` if this body is advanced by a nested propagator.
    pub fn is_delegated(&self) -> bool {
        self.propagator.is_some()
    }

    /// Final state from the latest successful run.
    pub fn final_state(&self) -> Option<&State> {
        self.final_state.as_ref()
    }

    /// Sampled history from the latest successful run.
    pub fn history(&self) -> &History {
        &self.history
    }

    pub(crate) fn set_initial_state(&mut self, state: State) {
        self.initial_state = Some(state);
    }

    pub(crate) fn set_propagator(&mut self, propagator: Option<PropagatorId>) {
        self.propagator = propagator;
    }

    pub(crate) fn push_sample(&mut self, time: TimeValue, state: State) -> Result<(), TimeValue> {
        self.history.push(time, state)
    }

    pub(crate) fn set_final_state(&mut self, state: State) {
        self.final_state = Some(state);
    }

    pub(crate) fn set_result(&mut self, final_state: State, history: History) {
        self.final_state = Some(final_state);
        self.history = history;
    }

    pub(crate) fn clear_result(&mut self) {
        self.final_state = None;
        self.history.clear();
    }
}
