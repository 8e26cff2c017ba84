//! Time-ordered propagation history.

use orbis_core::{State, TimeValue};

/// Ordered `time -> state` samples produced by one propagation run.
///
/// Samples are kept strictly ascending by time; [`push`](Self::push)
/// rejects anything that does not follow the latest sample. Stored as a
/// sorted vector because samples always arrive in order and lookups are
/// binary searches.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct History {
    samples: Vec<(TimeValue, State)>,
}

impl History {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample.
    ///
    /// Returns `Err(last)` with the latest stored time if `time` is not
    /// strictly greater than it, or if `time` is NaN.
    pub fn push(&mut self, time: TimeValue, state: State) -> Result<(), TimeValue> {
        if let Some(&(last, _)) = self.samples.last() {
            if !(time > last) {
                return Err(last);
            }
        } else if time.is_nan() {
            return Err(f64::NAN);
        }
        self.samples.push((time, state));
        Ok(())
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if no samples were recorded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The state sampled at exactly `time`, if any.
    pub fn get(&self, time: TimeValue) -> Option<&State> {
        self.samples
            .binary_search_by(|(t, _)| t.total_cmp(&time))
            .ok()
            .map(|i| &self.samples[i].1)
    }

    /// Earliest sample.
    pub fn first(&self) -> Option<(TimeValue, &State)> {
        self.samples.first().map(|(t, s)| (*t, s))
    }

    /// Latest sample.
    pub fn last(&self) -> Option<(TimeValue, &State)> {
        self.samples.last().map(|(t, s)| (*t, s))
    }

    /// Iterate samples in ascending time order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (TimeValue, &State)> + '_ {
        self.samples.iter().map(|(t, s)| (*t, s))
    }

    /// Sample times in ascending order.
    pub fn times(&self) -> impl DoubleEndedIterator<Item = TimeValue> + '_ {
        self.samples.iter().map(|(t, _)| *t)
    }

    /// Drop every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = (TimeValue, &'a State);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (TimeValue, State)>,
        fn(&'a (TimeValue, State)) -> (TimeValue, &'a State),
    >;

    fn into_iter(self) -> Self::IntoIter {
        fn split(sample: &(TimeValue, State)) -> (TimeValue, &State) {
            (sample.0, &sample.1)
        }
        self.samples
            .iter()
            .map(split as fn(&'a (TimeValue, State)) -> (TimeValue, &'a State))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: f64) -> State {
        State::from([v])
    }

    #[test]
    fn push_accepts_ascending_times() {
        let mut h = History::new();
        h.push(0.0, s(0.0)).unwrap();
        h.push(0.5, s(1.0)).unwrap();
        h.push(2.0, s(2.0)).unwrap();
        assert_eq!(h.len(), 3);
        assert_eq!(h.times().collect::<Vec<_>>(), vec![0.0, 0.5, 2.0]);
        assert_eq!(h.first().map(|(t, _)| t), Some(0.0));
        assert_eq!(h.last().map(|(_, st)| st.clone()), Some(s(2.0)));
    }

    #[test]
    fn push_rejects_duplicates_and_regressions() {
        let mut h = History::new();
        h.push(1.0, s(0.0)).unwrap();
        assert_eq!(h.push(1.0, s(1.0)), Err(1.0));
        assert_eq!(h.push(0.5, s(1.0)), Err(1.0));
        assert!(h.push(f64::NAN, s(1.0)).is_err());
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn nan_rejected_on_empty_history() {
        let mut h = History::new();
        assert!(h.push(f64::NAN, s(0.0)).is_err());
        assert!(h.is_empty());
    }

    #[test]
    fn exact_lookup() {
        let mut h = History::new();
        for (i, t) in [0.0, 25.0, 50.0].into_iter().enumerate() {
            h.push(t, s(i as f64)).unwrap();
        }
        assert_eq!(h.get(25.0), Some(&s(1.0)));
        assert_eq!(h.get(30.0), None);
    }

    #[test]
    fn iteration_by_reference() {
        let mut h = History::new();
        h.push(0.0, s(3.0)).unwrap();
        h.push(1.0, s(4.0)).unwrap();
        let collected: Vec<_> = (&h).into_iter().map(|(t, st)| (t, st[0])).collect();
        assert_eq!(collected, vec![(0.0, 3.0), (1.0, 4.0)]);
        h.clear();
        assert!(h.is_empty());
    }
}
