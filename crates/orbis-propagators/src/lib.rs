//! Reference propagation strategies for the Orbis propagator framework.
//!
//! - [`NumericalPropagator`]: fixed-step Euler or RK4 integration of a
//!   [`StateDerivative`] model.
//! - [`AnalyticPropagator`]: closed-form solution `f(state, elapsed)`.
//! - [`CompositePropagator`]: advances nothing itself; every body is
//!   routed to a nested propagator held in a
//!   [`PropagatorRegistry`](orbis_propagator::PropagatorRegistry).

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod analytic;
pub mod composite;
pub mod numerical;

pub use analytic::AnalyticPropagator;
pub use composite::CompositePropagator;
pub use numerical::{Integrator, NumericalPropagator, StateDerivative};
