//! The opaque [`State`] vector.

use smallvec::SmallVec;
use std::fmt;
use std::ops::Index;

/// Dynamical state of one body at one instant.
///
/// A fixed-size vector of `f64` components. The orchestration layer treats
/// it as an opaque value: it is stored, cloned and handed back, never
/// interpreted. The timestamp lives in the owning history, not here.
///
/// Uses `SmallVec<[f64; 6]>` so the common position + velocity layout
/// stays inline; larger states spill to the heap transparently.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct State {
    values: SmallVec<[f64; 6]>,
}

impl State {
    /// Build a state from its components.
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// A state of `dim` zero components.
    pub fn zeros(dim: usize) -> Self {
        Self {
            values: SmallVec::from_elem(0.0, dim),
        }
    }

    /// Copy a state out of a slice.
    pub fn from_slice(values: &[f64]) -> Self {
        Self {
            values: SmallVec::from_slice(values),
        }
    }

    /// Number of components.
    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the state has no components.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The components as a slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// The components as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Iterate over the components.
    pub fn iter(&self) -> impl Iterator<Item = &f64> + '_ {
        self.values.iter()
    }

    /// Index of the first NaN or infinite component, if any.
    pub fn first_non_finite(&self) -> Option<usize> {
        self.values.iter().position(|v| !v.is_finite())
    }

    /// Returns `true` if every component is finite.
    pub fn is_finite(&self) -> bool {
        self.first_non_finite().is_none()
    }

    /// `self + factor * other`, component-wise.
    ///
    /// # Panics
    ///
    /// Panics if the two states differ in dimension.
    pub fn add_scaled(&self, other: &State, factor: f64) -> State {
        assert_eq!(
            self.dim(),
            other.dim(),
            "state dimension mismatch: {} vs {}",
            self.dim(),
            other.dim()
        );
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a + factor * b)
            .collect()
    }
}

impl Index<usize> for State {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.values[index]
    }
}

impl FromIterator<f64> for State {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl From<Vec<f64>> for State {
    fn from(values: Vec<f64>) -> Self {
        Self {
            values: SmallVec::from_vec(values),
        }
    }
}

impl<const N: usize> From<[f64; N]> for State {
    fn from(values: [f64; N]) -> Self {
        Self::from_slice(&values)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, "]")
    }
}
