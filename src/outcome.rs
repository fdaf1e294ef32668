//! Outcome and source-location types shared by every stage of a run.
//!
//! Examples produce an [`Outcome`]; the runner aggregates outcomes and the
//! formatters render them. Conversions from plain values (`()`, `bool`,
//! `Result`) live here as well so example bodies stay terse.

use std::any::Any;
use std::fmt;

// ============================================================================
// SOURCE LOCATIONS
// ============================================================================

/// How trustworthy a reported source position is.
///
/// Best-effort locations come from heuristic collaborators (stack inspection,
/// wrapper macros) and are flagged as approximate in failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationAccuracy {
    /// Captured directly at the declaring call site.
    Exact,
    /// Inferred; may point near, rather than at, the real site.
    BestEffort,
}

/// A source position attached to a spec item and echoed in failure reports.
///
/// # Examples
///
/// ```rust
/// use pramana::SourceLocation;
/// let loc = SourceLocation::exact("spec/arith.rs", 12, 5);
/// assert_eq!(loc.to_string(), "spec/arith.rs:12:5");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub accuracy: LocationAccuracy,
}

impl SourceLocation {
    /// Creates a location captured directly at a call site.
    pub fn exact(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            accuracy: LocationAccuracy::Exact,
        }
    }

    /// Creates a heuristically inferred location.
    pub fn best_effort(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            accuracy: LocationAccuracy::BestEffort,
        }
    }

    pub fn is_best_effort(&self) -> bool {
        self.accuracy == LocationAccuracy::BestEffort
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Captures an exact [`SourceLocation`] at the macro call site.
#[macro_export]
macro_rules! location {
    () => {
        $crate::SourceLocation::exact(file!(), line!(), column!())
    };
}

// ============================================================================
// OUTCOMES
// ============================================================================

/// Renders a caught panic payload as text.
///
/// Panics carry `&str` or `String` payloads in practice; anything else gets
/// a fixed placeholder.
pub fn describe_panic(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unrecognized panic payload".to_string()
    }
}

/// The structured explanation of why an item failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The example signalled failure without an explanation.
    NoReason,
    /// An explicit assertion-style message.
    Reason(String),
    /// A structured comparison failure, rendered as a line diff.
    ExpectedButGot {
        preface: Option<String>,
        expected: String,
        actual: String,
    },
    /// A panic that escaped the example, rendered as text.
    Fault(String),
}

/// The result of executing one spec item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Intentionally skipped, with an optional human reason. Not a failure.
    Pending(Option<String>),
    Failure(FailureReason),
}

impl Outcome {
    /// Shorthand for a failure carrying a plain message.
    pub fn failure(message: impl Into<String>) -> Self {
        Outcome::Failure(FailureReason::Reason(message.into()))
    }

    /// Shorthand for a pending outcome with a reason.
    pub fn pending(reason: impl Into<String>) -> Self {
        Outcome::Pending(Some(reason.into()))
    }

    /// Shorthand for a comparison failure without preface lines.
    pub fn expected_but_got(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Outcome::Failure(FailureReason::ExpectedButGot {
            preface: None,
            expected: expected.into(),
            actual: actual.into(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

/// Conversion into an [`Outcome`], so example bodies can return plain values.
pub trait IntoOutcome {
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Outcome {
        self
    }
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Outcome {
        Outcome::Success
    }
}

impl IntoOutcome for bool {
    fn into_outcome(self) -> Outcome {
        if self {
            Outcome::Success
        } else {
            Outcome::Failure(FailureReason::NoReason)
        }
    }
}

impl<E: fmt::Display> IntoOutcome for Result<(), E> {
    fn into_outcome(self) -> Outcome {
        match self {
            Ok(()) => Outcome::Success,
            Err(e) => Outcome::Failure(FailureReason::Reason(e.to_string())),
        }
    }
}
