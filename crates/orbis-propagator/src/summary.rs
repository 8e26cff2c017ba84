//! Human-readable diagnostic summary of a propagator's configuration.

use std::fmt;

use crate::base::PropagatorBase;

/// Borrowing [`Display`](fmt::Display) adapter over a [`PropagatorBase`].
///
/// The plain form is one line:
///
/// ```text
/// rk4: interval [0, 100], 2 bodies, output every 25
/// ```
///
/// The alternate form (`{:#}`) appends one line per registered body.
/// Formatting never touches the propagator's configuration or results.
#[derive(Clone, Copy)]
pub struct Summary<'a> {
    name: &'a str,
    base: &'a PropagatorBase,
}

impl<'a> Summary<'a> {
    /// Summarize `base` under the given propagator name.
    pub fn new(name: &'a str, base: &'a PropagatorBase) -> Self {
        Self { name, base }
    }
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.base.body_count();
        write!(
            f,
            "{}: interval [{}, {}], {} {}, ",
            self.name,
            self.base.propagation_interval_start(),
            self.base.propagation_interval_end(),
            count,
            if count == 1 { "body" } else { "bodies" },
        )?;
        match self.base.fixed_output_interval() {
            Some(step) => write!(f, "output every {step}")?,
            None => write!(f, "final state only")?,
        }

        if f.alternate() {
            for record in self.base.records() {
                write!(f, "\n  body {}: ", record.body())?;
                match record.propagator() {
                    Some(id) => write!(f, "delegated to {id}")?,
                    None if record.initial_state().is_some() => write!(f, "local")?,
                    None => write!(f, "local, no initial state")?,
                }
                if record.final_state().is_some() && self.base.is_computed() {
                    write!(f, ", {} samples", record.history().len())?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_core::{BodyId, PropagatorId, State};

    #[test]
    fn one_line_summary() {
        let mut base = PropagatorBase::with_interval(0.0, 100.0);
        base.add_body(BodyId(1));
        base.add_body(BodyId(2));
        base.set_fixed_output_interval(25.0).unwrap();
        assert_eq!(
            Summary::new("rk4", &base).to_string(),
            "rk4: interval [0, 100], 2 bodies, output every 25"
        );
    }

    #[test]
    fn singular_body_and_no_sampling() {
        let mut base = PropagatorBase::with_interval(-1.5, 2.0);
        base.add_body(BodyId(1));
        assert_eq!(
            Summary::new("kepler", &base).to_string(),
            "kepler: interval [-1.5, 2], 1 body, final state only"
        );
    }

    #[test]
    fn alternate_lists_bodies() {
        let mut base = PropagatorBase::with_interval(0.0, 1.0);
        base.add_body(BodyId(1));
        base.add_body(BodyId(2));
        base.add_body(BodyId(3));
        base.set_initial_state(BodyId(1), State::from([0.0])).unwrap();
        base.set_propagator(BodyId(2), PropagatorId(4)).unwrap();
        let text = format!("{:#}", Summary::new("composite", &base));
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "  body 1: local");
        assert_eq!(lines[2], "  body 2: delegated to #4");
        assert_eq!(lines[3], "  body 3: local, no initial state");
    }

    #[test]
    fn rendering_does_not_mutate() {
        let mut base = PropagatorBase::with_interval(0.0, 1.0);
        base.add_body(BodyId(1));
        base.set_initial_state(BodyId(1), State::from([0.0])).unwrap();
        let before = format!("{base:?}");
        let _ = Summary::new("x", &base).to_string();
        let _ = format!("{:#}", Summary::new("x", &base));
        assert_eq!(format!("{base:?}"), before);
    }
}
