//! Crate-level error type for fallible runner machinery.
//!
//! Item failures are not errors; they are outcomes aggregated into the run
//! report. This type covers the plumbing around them: the report stream and
//! the worker pool.

use miette::Diagnostic;
use thiserror::Error;

/// Failure modes surfaced by [`run`](crate::run) and [`run_with`](crate::run_with).
#[derive(Debug, Error, Diagnostic)]
pub enum PramanaError {
    /// The report stream rejected a write.
    #[error("report output failed: {0}")]
    #[diagnostic(code(pramana::report::io))]
    ReportIo(#[from] std::io::Error),

    /// The worker pool for parallel items could not be constructed.
    #[error("worker pool construction failed: {0}")]
    #[diagnostic(
        code(pramana::runner::pool),
        help("lower `RunConfig::jobs` or check the process thread limit")
    )]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),
}
