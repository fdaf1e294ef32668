pub use crate::builder::Spec;
pub use crate::config::{ColorMode, FormatMode, Interrupt, RunConfig};
pub use crate::error::PramanaError;
pub use crate::example::Example;
pub use crate::format::{FailedExamples, FormatCtx, Formatter, Progress, Silent, Specdoc};
pub use crate::outcome::{
    describe_panic, FailureReason, IntoOutcome, LocationAccuracy, Outcome, SourceLocation,
};
pub use crate::runner::{run, run_with};
pub use crate::state::{FailureRecord, RunReport, RunState, SpecPath};

pub mod builder;
pub mod config;
pub mod error;
pub mod example;
pub mod format;
pub mod hooks;
pub mod outcome;
pub mod runner;
pub mod state;
pub mod tree;
