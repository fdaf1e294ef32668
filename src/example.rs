//! The capability that lets heterogeneous values act as spec items.

use std::fmt;

use crate::outcome::{IntoOutcome, Outcome};

/// Anything that can be run once with a parameter to produce an [`Outcome`].
///
/// Implementations cover [`Outcome`] itself, `bool`, `Result<(), E>`, and any
/// nullary closure returning a value convertible via [`IntoOutcome`].
/// Closures that consume the parameter are declared through
/// [`Spec::it_with`](crate::Spec::it_with), which keeps the blanket impl
/// nullary and coherent.
pub trait Example: Send + 'static {
    /// The parameter this example consumes.
    type Param;

    /// Runs the example to completion.
    fn run(self, param: &Self::Param) -> Outcome;
}

impl Example for Outcome {
    type Param = ();

    fn run(self, _param: &()) -> Outcome {
        self
    }
}

impl Example for bool {
    type Param = ();

    fn run(self, _param: &()) -> Outcome {
        self.into_outcome()
    }
}

impl<E> Example for Result<(), E>
where
    E: fmt::Display + Send + 'static,
{
    type Param = ();

    fn run(self, _param: &()) -> Outcome {
        self.into_outcome()
    }
}

impl<F, R> Example for F
where
    F: FnOnce() -> R + Send + 'static,
    R: IntoOutcome,
{
    type Param = ();

    fn run(self, _param: &()) -> Outcome {
        self().into_outcome()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::FailureReason;

    #[test]
    fn closures_and_values_run_as_examples() {
        assert_eq!((|| ()).run(&()), Outcome::Success);
        assert_eq!((|| false).run(&()), Outcome::Failure(FailureReason::NoReason));
        assert_eq!(true.run(&()), Outcome::Success);
        assert_eq!(
            Outcome::pending("later").run(&()),
            Outcome::Pending(Some("later".into()))
        );
        let failing: Result<(), String> = Err("off by one".into());
        assert_eq!(
            failing.run(&()),
            Outcome::Failure(FailureReason::Reason("off by one".into()))
        );
    }
}
