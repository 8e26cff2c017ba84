//! Propagator trait, shared base, and delegation registry for Orbis.
//!
//! The [`Propagator`] trait defines the `propagate()` contract; the
//! [`PropagatorBase`] it exposes owns interval bounds, per-body records,
//! final states and sampled history. Composite trees are built in a
//! [`PropagatorRegistry`] and run through a [`PropagationContext`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod base;
pub mod config;
pub mod context;
pub mod history;
pub mod interval;
pub mod propagator;
pub mod record;
pub mod registry;
pub mod summary;

pub use base::PropagatorBase;
pub use config::{ConfigError, PropagationConfig};
pub use context::{Delegation, PropagationContext};
pub use history::History;
pub use interval::{PropagationInterval, SampleTimes};
pub use propagator::Propagator;
pub use record::PropagationRecord;
pub use registry::PropagatorRegistry;
pub use summary::Summary;
