//! Per-run aggregation state and the final report snapshot.
//!
//! One [`RunState`] exists per run, owned and mutated only by the reporting
//! thread; formatters read it through their context. [`RunReport`] is the
//! immutable snapshot handed back to the caller when the run returns.

use std::fmt;
use std::time::{Duration, Instant};

use crate::outcome::{FailureReason, SourceLocation};

// ============================================================================
// PATHS AND FAILURE RECORDS
// ============================================================================

/// Where an item sits in the tree: enclosing group names plus the
/// requirement string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecPath {
    pub groups: Vec<String>,
    pub requirement: String,
}

impl SpecPath {
    pub fn new(groups: Vec<String>, requirement: impl Into<String>) -> Self {
        Self {
            groups,
            requirement: requirement.into(),
        }
    }
}

impl fmt::Display for SpecPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.groups.is_empty() {
            write!(f, "{}", self.requirement)
        } else {
            write!(f, "{} {}", self.groups.join("."), self.requirement)
        }
    }
}

/// One recorded failure, kept for the failure detail block.
#[derive(Debug, Clone)]
pub struct FailureRecord {
    pub location: Option<SourceLocation>,
    pub path: SpecPath,
    pub reason: FailureReason,
}

// ============================================================================
// RUN STATE
// ============================================================================

/// Aggregation state for one run.
pub struct RunState {
    pub success_count: usize,
    pub pending_count: usize,
    pub failure_count: usize,
    pub failures: Vec<FailureRecord>,
    /// Seed used for sibling shuffling, when ordering was randomized.
    pub seed: Option<u64>,
    started: Instant,
    cpu_started: Option<Duration>,
}

impl RunState {
    pub(crate) fn new() -> Self {
        Self {
            success_count: 0,
            pending_count: 0,
            failure_count: 0,
            failures: Vec::new(),
            seed: None,
            started: Instant::now(),
            cpu_started: process_cpu_time(),
        }
    }

    pub(crate) fn record_success(&mut self) {
        self.success_count += 1;
    }

    pub(crate) fn record_pending(&mut self) {
        self.pending_count += 1;
    }

    pub(crate) fn record_failure(&mut self, record: FailureRecord) {
        self.failure_count += 1;
        self.failures.push(record);
    }

    /// Examples executed so far, whatever their outcome.
    pub fn example_count(&self) -> usize {
        self.success_count + self.pending_count + self.failure_count
    }

    /// Wall-clock time since the run began.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Process CPU time consumed since the run began, where measurable.
    pub fn cpu_elapsed(&self) -> Option<Duration> {
        match (self.cpu_started, process_cpu_time()) {
            (Some(start), Some(now)) => Some(now.saturating_sub(start)),
            _ => None,
        }
    }

    pub(crate) fn snapshot(&self, interrupted: bool) -> RunReport {
        RunReport {
            successes: self.success_count,
            pending: self.pending_count,
            failures: self.failures.clone(),
            interrupted,
            wall_time: self.elapsed(),
            cpu_time: self.cpu_elapsed(),
            seed: self.seed,
        }
    }
}

// ============================================================================
// RUN REPORT
// ============================================================================

/// Immutable summary returned when a run completes; embedding callers make
/// exit-code decisions from this alone.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub successes: usize,
    pub pending: usize,
    /// Every recorded failure, in report order.
    pub failures: Vec<FailureRecord>,
    /// Whether the run was cut short by an interrupt.
    pub interrupted: bool,
    pub wall_time: Duration,
    pub cpu_time: Option<Duration>,
    pub seed: Option<u64>,
}

impl RunReport {
    /// True when no item failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Examples executed, whatever their outcome.
    pub fn example_count(&self) -> usize {
        self.successes + self.pending + self.failures.len()
    }
}

// ============================================================================
// CPU TIME
// ============================================================================

#[cfg(unix)]
fn process_cpu_time() -> Option<Duration> {
    let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::clock_gettime(libc::CLOCK_PROCESS_CPUTIME_ID, &mut ts) };
    if rc == 0 {
        Some(Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32))
    } else {
        None
    }
}

#[cfg(not(unix))]
fn process_cpu_time() -> Option<Duration> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_display_joins_groups_with_dots() {
        let path = SpecPath::new(vec!["Arith".into(), "Add".into()], "adds two numbers");
        assert_eq!(path.to_string(), "Arith.Add adds two numbers");
        let bare = SpecPath::new(vec![], "stands alone");
        assert_eq!(bare.to_string(), "stands alone");
    }

    #[test]
    fn state_counts_roll_up_into_the_report() {
        let mut state = RunState::new();
        state.record_success();
        state.record_success();
        state.record_pending();
        state.record_failure(FailureRecord {
            location: None,
            path: SpecPath::new(vec![], "broken"),
            reason: FailureReason::NoReason,
        });

        assert_eq!(state.example_count(), 4);
        let report = state.snapshot(false);
        assert_eq!(report.successes, 2);
        assert_eq!(report.pending, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path.to_string(), "broken");
        assert!(!report.is_success());
        assert!(!report.interrupted);
    }

    #[cfg(unix)]
    #[test]
    fn cpu_time_is_measurable_on_unix() {
        assert!(process_cpu_time().is_some());
    }
}
