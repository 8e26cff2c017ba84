//! Core types and errors for the Orbis propagation framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the identifiers, the opaque [`State`] vector, and the error taxonomy
//! shared by every propagator in the workspace.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod state;

pub use error::{
    CompositionError, ConfigurationError, NumericalFailure, PropagationError, Result,
};
pub use id::{BodyId, PropagatorId, TimeValue};
pub use state::State;
