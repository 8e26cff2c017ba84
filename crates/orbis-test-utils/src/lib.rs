//! Test fixtures for Orbis development.
//!
//! Provides fixture propagators (see [`fixtures`]) and small helpers for
//! building states and comparing them in assertions.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{CallCounter, ConstantVelocity, CountingPropagator, FailingPropagator};

use orbis_core::State;

/// A one-dimensional `[position, velocity]` state.
pub fn pv(position: f64, velocity: f64) -> State {
    State::from([position, velocity])
}

/// Returns `true` if both states have the same dimension and every
/// component differs by at most `tolerance`.
pub fn approx_eq(a: &State, b: &State, tolerance: f64) -> bool {
    a.dim() == b.dim() && a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= tolerance)
}
