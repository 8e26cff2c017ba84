//! Pure orchestration over nested propagators.
//!
//! A [`CompositePropagator`] has no advancement method of its own: every
//! registered body must be assigned a nested propagator, and a run fails
//! with [`ConfigurationError::NoStrategyForBody`] otherwise.

use log::warn;
use orbis_core::{BodyId, ConfigurationError, PropagatorId, Result, TimeValue};
use orbis_propagator::{PropagationContext, Propagator, PropagatorBase};

/// Delegates each body to its assigned nested propagator.
pub struct CompositePropagator {
    name: String,
    base: PropagatorBase,
}

impl CompositePropagator {
    /// Create an empty composite over `[0, 0]` with sampling disabled.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: PropagatorBase::new(),
        }
    }

    /// Set the propagation interval.
    pub fn with_interval(mut self, start: TimeValue, end: TimeValue) -> Self {
        self.base.set_propagation_interval_start(start);
        self.base.set_propagation_interval_end(end);
        self
    }

    /// Register `body` and route it to `propagator` in one call.
    pub fn route(&mut self, body: BodyId, propagator: PropagatorId) -> Result<()> {
        self.base.add_body(body);
        self.base.set_propagator(body, propagator)
    }

    fn first_unrouted(&self) -> Option<BodyId> {
        self.base
            .records()
            .find(|record| !record.is_delegated())
            .map(|record| record.body())
    }
}

impl Propagator for CompositePropagator {
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
        if let Some(body) = self.first_unrouted() {
            self.base.abort_run();
            let err = ConfigurationError::NoStrategyForBody {
                body,
                propagator: self.name.clone(),
            };
            warn!("'{}' propagation failed: {err}", self.name);
            return Err(err.into());
        }
        let name = &self.name;
        self.base.drive(name, ctx, |body, _, _, _| {
            Err(ConfigurationError::NoStrategyForBody {
                body,
                propagator: name.clone(),
            }
            .into())
        })
    }
}
