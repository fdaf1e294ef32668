//! Pluggable report rendering.
//!
//! The runner drives a [`Formatter`] through the callbacks below, in tree
//! declaration order, handing each one a [`FormatCtx`] with the output
//! stream, scoped color helpers, and read access to the run's aggregation
//! state. Every callback defaults to a no-op, so [`Silent`] is the empty
//! impl and custom formatters override only the slots they need.

mod diff;
mod failed;
mod progress;
mod specdoc;

pub use failed::FailedExamples;
pub use progress::Progress;
pub use specdoc::Specdoc;

use std::io;
use std::time::Duration;

use termcolor::{Color, ColorSpec, WriteColor};

use crate::outcome::{FailureReason, SourceLocation};
use crate::state::{FailureRecord, RunState, SpecPath};

// ============================================================================
// FORMATTER CONTRACT
// ============================================================================

/// Callback slots the runner invokes while executing a tree.
///
/// Events arrive in tree declaration order even when execution is parallel;
/// the runner serializes emission on the reporting thread.
pub trait Formatter {
    /// Called once, before any execution.
    fn on_header(&mut self, _ctx: &mut FormatCtx<'_>) -> io::Result<()> {
        Ok(())
    }

    /// Entering a group; `path` holds the enclosing group names, outermost
    /// first, not including `name` itself.
    fn on_group_started(
        &mut self,
        _ctx: &mut FormatCtx<'_>,
        _path: &[String],
        _name: &str,
    ) -> io::Result<()> {
        Ok(())
    }

    /// Leaving the group most recently started.
    fn on_group_done(&mut self, _ctx: &mut FormatCtx<'_>) -> io::Result<()> {
        Ok(())
    }

    /// An item is about to run; `current` is its 1-based ordinal in report
    /// order.
    fn on_item_progress(
        &mut self,
        _ctx: &mut FormatCtx<'_>,
        _location: Option<&SourceLocation>,
        _current: usize,
        _total: usize,
    ) -> io::Result<()> {
        Ok(())
    }

    fn on_item_succeeded(&mut self, _ctx: &mut FormatCtx<'_>, _path: &SpecPath) -> io::Result<()> {
        Ok(())
    }

    fn on_item_failed(
        &mut self,
        _ctx: &mut FormatCtx<'_>,
        _path: &SpecPath,
        _reason: &FailureReason,
    ) -> io::Result<()> {
        Ok(())
    }

    fn on_item_pending(
        &mut self,
        _ctx: &mut FormatCtx<'_>,
        _path: &SpecPath,
        _reason: Option<&str>,
    ) -> io::Result<()> {
        Ok(())
    }

    /// Called after the tree finishes, only when at least one item failed.
    fn on_failures_summary(&mut self, _ctx: &mut FormatCtx<'_>) -> io::Result<()> {
        Ok(())
    }

    /// Called last, after any failure summary.
    fn on_footer(&mut self, _ctx: &mut FormatCtx<'_>) -> io::Result<()> {
        Ok(())
    }
}

/// The formatter that prints nothing; every callback keeps its default.
pub struct Silent;

impl Formatter for Silent {}

// ============================================================================
// REPORT-WRITER CONTEXT
// ============================================================================

/// Write handle passed to every callback, bundling the output stream with
/// read access to the run's state.
pub struct FormatCtx<'a> {
    out: &'a mut dyn WriteColor,
    state: &'a RunState,
    total: usize,
    live_progress: bool,
}

impl<'a> FormatCtx<'a> {
    pub(crate) fn new(
        out: &'a mut dyn WriteColor,
        state: &'a RunState,
        total: usize,
        live_progress: bool,
    ) -> Self {
        Self {
            out,
            state,
            total,
            live_progress,
        }
    }

    /// Writes a fragment without a line terminator.
    pub fn write(&mut self, text: &str) -> io::Result<()> {
        write!(self.out, "{}", text)
    }

    /// Writes one full line.
    pub fn write_line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", text)
    }

    pub fn blank_line(&mut self) -> io::Result<()> {
        writeln!(self.out)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Whether transient in-place progress output is sensible on this
    /// stream.
    pub fn live_progress(&self) -> bool {
        self.live_progress
    }

    // ------------------------------------------------------------------
    // Color scoping. The color is reset after the inner writes whether or
    // not they succeeded.
    // ------------------------------------------------------------------

    pub fn with_success_color<F>(&mut self, body: F) -> io::Result<()>
    where
        F: FnOnce(&mut Self) -> io::Result<()>,
    {
        self.with_color(Color::Green, body)
    }

    pub fn with_fail_color<F>(&mut self, body: F) -> io::Result<()>
    where
        F: FnOnce(&mut Self) -> io::Result<()>,
    {
        self.with_color(Color::Red, body)
    }

    pub fn with_pending_color<F>(&mut self, body: F) -> io::Result<()>
    where
        F: FnOnce(&mut Self) -> io::Result<()>,
    {
        self.with_color(Color::Yellow, body)
    }

    pub fn with_info_color<F>(&mut self, body: F) -> io::Result<()>
    where
        F: FnOnce(&mut Self) -> io::Result<()>,
    {
        self.with_color(Color::Cyan, body)
    }

    fn with_color<F>(&mut self, color: Color, body: F) -> io::Result<()>
    where
        F: FnOnce(&mut Self) -> io::Result<()>,
    {
        self.out.set_color(ColorSpec::new().set_fg(Some(color)))?;
        let result = body(self);
        let reset = self.out.reset();
        result.and(reset)
    }

    // ------------------------------------------------------------------
    // State access
    // ------------------------------------------------------------------

    pub fn success_count(&self) -> usize {
        self.state.success_count
    }

    pub fn pending_count(&self) -> usize {
        self.state.pending_count
    }

    pub fn failure_count(&self) -> usize {
        self.state.failure_count
    }

    /// Examples executed so far, whatever their outcome.
    pub fn example_count(&self) -> usize {
        self.state.example_count()
    }

    /// Failure records accumulated so far, in report order.
    pub fn failures(&self) -> &[FailureRecord] {
        &self.state.failures
    }

    pub fn elapsed(&self) -> Duration {
        self.state.elapsed()
    }

    pub fn cpu_elapsed(&self) -> Option<Duration> {
        self.state.cpu_elapsed()
    }

    /// Seed used for sibling shuffling, when ordering was randomized.
    pub fn seed(&self) -> Option<u64> {
        self.state.seed
    }

    /// Total items planned for this run.
    pub fn total_items(&self) -> usize {
        self.total
    }
}

// ============================================================================
// SHARED RENDERING
// ============================================================================

/// `1 example` / `3 examples`.
pub(crate) fn pluralize(count: usize, singular: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}s", count, singular)
    }
}

/// Writes the numbered failure detail block shared by the built-ins.
pub(crate) fn write_failures_block(ctx: &mut FormatCtx<'_>) -> io::Result<()> {
    let failures = ctx.failures().to_vec();
    ctx.blank_line()?;
    ctx.write_line("Failures:")?;

    let mut any_best_effort = false;
    for (index, record) in failures.iter().enumerate() {
        ctx.blank_line()?;
        ctx.write_line(&format!("  {}) {}", index + 1, record.path))?;
        if let Some(location) = &record.location {
            let marker = if location.is_best_effort() {
                any_best_effort = true;
                "~"
            } else {
                ""
            };
            let line = format!("     at {}{}", marker, location);
            ctx.with_info_color(|c| c.write_line(&line))?;
        }
        match &record.reason {
            FailureReason::NoReason => {}
            FailureReason::Reason(text) => {
                for line in text.lines() {
                    ctx.write_line(&format!("     {}", line))?;
                }
            }
            FailureReason::Fault(text) => {
                ctx.write_line(&format!("     uncaught panic: {}", text))?;
            }
            FailureReason::ExpectedButGot {
                preface,
                expected,
                actual,
            } => {
                diff::write_expected_but_got(ctx, preface.as_deref(), expected, actual)?;
            }
        }
    }

    if any_best_effort {
        ctx.blank_line()?;
        ctx.write_line("Locations marked with ~ are best-effort and may be inaccurate.")?;
    }
    Ok(())
}

/// Writes the summary footer shared by the built-ins: optional seed line,
/// elapsed times, then colored pluralized counts.
pub(crate) fn write_footer(ctx: &mut FormatCtx<'_>) -> io::Result<()> {
    ctx.blank_line()?;
    if let Some(seed) = ctx.seed() {
        let line = format!("Randomized with seed {}", seed);
        ctx.with_info_color(|c| c.write_line(&line))?;
    }

    let mut finished = format!("Finished in {:.4} seconds", ctx.elapsed().as_secs_f64());
    if let Some(cpu) = ctx.cpu_elapsed() {
        finished.push_str(&format!(
            ", used {:.4} seconds of CPU time",
            cpu.as_secs_f64()
        ));
    }
    ctx.write_line(&finished)?;

    let mut counts = format!(
        "{}, {}",
        pluralize(ctx.example_count(), "example"),
        pluralize(ctx.failure_count(), "failure")
    );
    if ctx.pending_count() > 0 {
        counts.push_str(&format!(", {} pending", ctx.pending_count()));
    }

    if ctx.failure_count() > 0 {
        ctx.with_fail_color(|c| c.write_line(&counts))
    } else if ctx.pending_count() > 0 {
        ctx.with_pending_color(|c| c.write_line(&counts))
    } else {
        ctx.with_success_color(|c| c.write_line(&counts))
    }
}
