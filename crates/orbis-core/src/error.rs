//! Error types for the Orbis propagation framework.
//!
//! Organized by failure class: configuration (caller misuse, recoverable),
//! not-yet-computed (result queried too early), numerical (the strategy
//! failed while advancing a state), and composition (the delegation tree
//! is malformed).

use thiserror::Error;

use crate::id::{BodyId, PropagatorId, TimeValue};

/// Result type for propagation operations.
pub type Result<T> = std::result::Result<T, PropagationError>;

/// Top-level error returned by propagator configuration, queries, and runs.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum PropagationError {
    /// The caller configured or queried the propagator incorrectly.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A result was requested before any successful `propagate()` call.
    #[error("no result available for body {body}: propagate() has not completed")]
    NotYetComputed {
        /// The body whose result was requested.
        body: BodyId,
    },

    /// The propagation strategy failed while advancing a state.
    #[error("numerical failure: {0}")]
    Numerical(#[from] NumericalFailure),

    /// The nested-propagator tree is malformed.
    #[error("composition error: {0}")]
    Composition(#[from] CompositionError),
}

impl PropagationError {
    /// Returns `true` for [`PropagationError::Configuration`].
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns `true` for [`PropagationError::NotYetComputed`].
    pub fn is_not_yet_computed(&self) -> bool {
        matches!(self, Self::NotYetComputed { .. })
    }

    /// Returns `true` for [`PropagationError::Numerical`].
    pub fn is_numerical(&self) -> bool {
        matches!(self, Self::Numerical(_))
    }

    /// Returns `true` for [`PropagationError::Composition`].
    pub fn is_composition(&self) -> bool {
        matches!(self, Self::Composition(_))
    }
}

/// Caller misuse detected while configuring or querying a propagator.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigurationError {
    /// The body was never passed to `add_body`.
    #[error("body {body} is not registered")]
    UnregisteredBody {
        /// The unknown body.
        body: BodyId,
    },

    /// A locally advanced body has no initial state.
    #[error("body {body} has no initial state")]
    MissingInitialState {
        /// The body without an initial state.
        body: BodyId,
    },

    /// The interval bounds are NaN/infinite, or the end precedes the start.
    #[error("invalid propagation interval [{start}, {end}]")]
    InvalidInterval {
        /// Configured start.
        start: TimeValue,
        /// Configured end.
        end: TimeValue,
    },

    /// The fixed output interval is negative or not finite.
    #[error("fixed output interval must be finite and non-negative, got {value}")]
    InvalidOutputInterval {
        /// The rejected value.
        value: TimeValue,
    },

    /// A history sample was recorded out of time order.
    #[error("history sample at t={time} for body {body} does not follow t={last}")]
    NonMonotonicHistory {
        /// The body whose history was written.
        body: BodyId,
        /// The rejected sample time.
        time: TimeValue,
        /// The latest time already in the history.
        last: TimeValue,
    },

    /// The propagator does not advance bodies itself and the body has no
    /// nested propagator assigned.
    #[error("body {body} has no nested propagator and '{propagator}' cannot advance it")]
    NoStrategyForBody {
        /// The body left without a strategy.
        body: BodyId,
        /// Name of the propagator that was asked to advance it.
        propagator: String,
    },
}

/// A propagation strategy failed while advancing a state.
///
/// Never accompanied by a fabricated result: a run that fails leaves no
/// final state behind.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum NumericalFailure {
    /// A component of the advanced state became NaN or infinite.
    #[error("'{propagator}' produced a non-finite state for body {body} at t={time} (component {component})")]
    NonFiniteState {
        /// Name of the failing propagator.
        propagator: String,
        /// The affected body.
        body: BodyId,
        /// Time at which the state was produced.
        time: TimeValue,
        /// Index of the first non-finite component.
        component: usize,
    },

    /// The strategy's own parameters cannot advance the state.
    #[error("'{propagator}' has an invalid step size {step}")]
    InvalidStepSize {
        /// Name of the failing propagator.
        propagator: String,
        /// The rejected step size.
        step: f64,
    },

    /// The dynamics model returned a derivative of the wrong dimension.
    #[error("'{propagator}' expected a state of dimension {expected}, got {actual}")]
    DimensionMismatch {
        /// Name of the failing propagator.
        propagator: String,
        /// Dimension of the state being advanced.
        expected: usize,
        /// Dimension that was produced.
        actual: usize,
    },

    /// Strategy-specific failure (divergence, solver breakdown, ...).
    #[error("'{propagator}' failed: {reason}")]
    Diverged {
        /// Name of the failing propagator.
        propagator: String,
        /// Human-readable description of the failure.
        reason: String,
    },
}

/// The nested-propagator tree cannot be executed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CompositionError {
    /// A propagator transitively delegates to itself.
    #[error("cyclic delegation: {}", format_cycle(.cycle))]
    Cycle {
        /// The propagators on the cycle, starting and ending at the same id.
        cycle: Vec<PropagatorId>,
    },

    /// A record references a propagator id the registry does not hold.
    #[error("unknown propagator {id}")]
    UnknownPropagator {
        /// The dangling handle.
        id: PropagatorId,
    },

    /// Delegation reached a propagator that is already running.
    #[error("propagator {id} is already running")]
    Reentrant {
        /// The propagator that was re-entered.
        id: PropagatorId,
    },

    /// A body was delegated, but the propagator was run outside a registry.
    #[error("body {body} delegates to {id}, but no registry is attached to this run")]
    Detached {
        /// The delegated body.
        body: BodyId,
        /// The nested propagator that could not be reached.
        id: PropagatorId,
    },
}

fn format_cycle(cycle: &[PropagatorId]) -> String {
    cycle
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
