//! Propagation interval bounds and fixed-output sampling instants.

use orbis_core::{ConfigurationError, TimeValue};

/// Relative slack allowed when the last sampling instant lands on the
/// interval end up to floating-point rounding.
const SAMPLE_SNAP_TOLERANCE: f64 = 1e-9;

/// Closed time interval `[start, end]` covered by one propagation run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PropagationInterval {
    /// First instant of the run.
    pub start: TimeValue,
    /// Last instant of the run; final states are defined here.
    pub end: TimeValue,
}

impl PropagationInterval {
    /// Create an interval. No validation happens until [`validate`](Self::validate).
    pub fn new(start: TimeValue, end: TimeValue) -> Self {
        Self { start, end }
    }

    /// Check that both bounds are finite and `end >= start`.
    ///
    /// A zero-length interval is valid: every body's final state equals
    /// its initial state.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.start.is_finite() || !self.end.is_finite() || self.end < self.start {
            return Err(ConfigurationError::InvalidInterval {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// Length of the interval.
    pub fn duration(&self) -> TimeValue {
        self.end - self.start
    }

    /// Returns `true` if `step` is at least the spacing between adjacent
    /// `f64` values at the interval's largest magnitude, so consecutive
    /// sampling instants stay distinct.
    pub fn resolves_step(&self, step: TimeValue) -> bool {
        let scale = self.start.abs().max(self.end.abs());
        let spacing = f64::from_bits(scale.to_bits() + 1) - scale;
        step >= spacing
    }

    /// Sampling instants `start + k * step` for `k = 0, 1, ...`, never past `end`.
    pub fn sample_times(&self, step: TimeValue) -> SampleTimes {
        SampleTimes::new(self.start, self.end, step)
    }
}

/// Iterator over fixed-output sampling instants.
///
/// Each instant is computed as `start + k * step` rather than by repeated
/// addition, so rounding error does not accumulate over long runs. An
/// instant that overshoots `end` by less than a rounding margin is snapped
/// to `end`; anything further out terminates the sequence.
#[derive(Clone, Debug)]
pub struct SampleTimes {
    start: TimeValue,
    end: TimeValue,
    step: TimeValue,
    k: u64,
    done: bool,
}

impl SampleTimes {
    /// Sampling instants over `[start, end]` spaced by `step`.
    ///
    /// Yields nothing if `step` is not strictly positive and finite, or if
    /// the interval is empty.
    pub fn new(start: TimeValue, end: TimeValue, step: TimeValue) -> Self {
        let done = !(step.is_finite() && step > 0.0) || !(end >= start);
        Self {
            start,
            end,
            step,
            k: 0,
            done,
        }
    }
}

impl Iterator for SampleTimes {
    type Item = TimeValue;

    fn next(&mut self) -> Option<TimeValue> {
        if self.done {
            return None;
        }
        let t = self.start + self.k as f64 * self.step;
        if t <= self.end {
            self.k += 1;
            return Some(t);
        }
        self.done = true;
        if t - self.end <= self.step * SAMPLE_SNAP_TOLERANCE {
            Some(self.end)
        } else {
            None
        }
    }
}
