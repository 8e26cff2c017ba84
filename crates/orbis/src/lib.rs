//! Orbis: a propagator framework for advancing body states over time.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Orbis sub-crates. For most users, adding `orbis` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use orbis::prelude::*;
//!
//! // Uniform motion of a [position, velocity] state.
//! let uniform = |s: &State, dt: TimeValue| State::from([s[0] + s[1] * dt, s[1]]);
//!
//! let mut registry = PropagatorRegistry::new();
//! let short = registry.insert(AnalyticPropagator::new("short", uniform).with_interval(0.0, 50.0));
//!
//! let mut owner = AnalyticPropagator::new("long", uniform).with_interval(0.0, 100.0);
//! owner.set_fixed_output_interval(25.0).unwrap();
//! for body in [BodyId(1), BodyId(2)] {
//!     owner.add_body(body);
//!     owner.set_initial_state(body, State::from([0.0, 1.0])).unwrap();
//! }
//! owner.set_propagator(BodyId(2), short).unwrap();
//! let root = registry.insert(owner);
//!
//! registry.propagate(root).unwrap();
//! let owner = registry.get(root).unwrap();
//! assert_eq!(owner.final_state(BodyId(1)).unwrap(), &State::from([100.0, 1.0]));
//! assert_eq!(owner.final_state(BodyId(2)).unwrap(), &State::from([50.0, 1.0]));
//! println!("{}", owner.summary());
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `orbis-core` | IDs, `State`, error types |
//! | [`propagator`] | `orbis-propagator` | `Propagator` trait, base, registry, config |
//! | [`propagators`] | `orbis-propagators` | Numerical, analytic and composite strategies |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and IDs (`orbis-core`).
///
/// Contains [`types::BodyId`], [`types::PropagatorId`], [`types::State`]
/// and the [`types::PropagationError`] hierarchy.
pub use orbis_core as types;

/// Propagator trait, shared base and delegation registry (`orbis-propagator`).
///
/// The [`propagator::Propagator`] trait is the main extension point for
/// user-defined propagation strategies.
pub use orbis_propagator as propagator;

/// Reference propagation strategies (`orbis-propagators`).
///
/// Includes [`propagators::NumericalPropagator`],
/// [`propagators::AnalyticPropagator`] and
/// [`propagators::CompositePropagator`].
pub use orbis_propagators as propagators;

/// Common imports for typical Orbis usage.
///
/// ```rust
/// use orbis::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use orbis_core::{BodyId, PropagatorId, State, TimeValue};

    // Errors
    pub use orbis_core::{
        CompositionError, ConfigurationError, NumericalFailure, PropagationError,
    };

    // Propagator
    pub use orbis_propagator::{
        History, PropagationConfig, PropagationContext, Propagator, PropagatorBase,
        PropagatorRegistry,
    };

    // Strategies
    pub use orbis_propagators::{
        AnalyticPropagator, CompositePropagator, Integrator, NumericalPropagator,
        StateDerivative,
    };
}
