//! Strongly-typed identifiers and the [`TimeValue`] type alias.

use std::fmt;

/// Simulation time.
///
/// Monotonic along one propagation run. Orbis never converts units; the
/// caller decides whether this is seconds, days, or something else.
pub type TimeValue = f64;

/// Identifies a body registered with a propagator.
///
/// Bodies are owned by the caller. A propagator only keeps the id as a
/// lookup key for its per-body record and never dereferences it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BodyId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Handle to a propagator stored in a `PropagatorRegistry`.
///
/// Assigned sequentially on insertion. A record that delegates a body to a
/// nested propagator stores this handle instead of a reference, so the
/// nested propagator's lifetime stays with the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropagatorId(pub u32);

impl fmt::Display for PropagatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for PropagatorId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
