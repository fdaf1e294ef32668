//! Per-run configuration and the shared interrupt handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use termcolor::ColorChoice;

/// Which built-in formatter [`run`](crate::run) reports through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatMode {
    /// Nested group and requirement lines, failure details, footer.
    Specdoc,
    /// One character per item, then failure details and footer.
    Progress,
    /// Failure details and footer only.
    FailedExamples,
    /// No output at all.
    Silent,
}

/// When to emit colors on the standard stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Colors only when stdout is a terminal.
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub(crate) fn to_color_choice(self) -> ColorChoice {
        match self {
            ColorMode::Auto => {
                if atty::is(atty::Stream::Stdout) {
                    ColorChoice::Auto
                } else {
                    ColorChoice::Never
                }
            }
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
        }
    }
}

/// A cloneable run-wide abort flag.
///
/// Triggering stops the scheduling of not-yet-started items. In-flight items
/// finish and are reported, cleanups still run, and the summary still
/// prints.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that the run stop scheduling new items.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Configuration for a single run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Worker threads for parallel-marked items; 0 uses the pool default.
    pub jobs: usize,
    /// Shuffle sibling order recursively before running.
    pub randomize: bool,
    /// Fixed shuffle seed; fresh entropy when `None` and `randomize` is set.
    pub seed: Option<u64>,
    /// Built-in formatter used by [`run`](crate::run).
    pub format: FormatMode,
    /// Color behavior for the standard stream writer.
    pub color: ColorMode,
    /// Transient in-place progress counters; `None` means only on a terminal.
    pub live_progress: Option<bool>,
    /// Shared abort flag; clone it to trigger the run from elsewhere.
    pub interrupt: Interrupt,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            jobs: 0,
            randomize: false,
            seed: None,
            format: FormatMode::Specdoc,
            color: ColorMode::Auto,
            live_progress: None,
            interrupt: Interrupt::new(),
        }
    }
}

impl RunConfig {
    pub(crate) fn live_progress_enabled(&self) -> bool {
        self.live_progress
            .unwrap_or_else(|| atty::is(atty::Stream::Stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sequential_specdoc_auto() {
        let config = RunConfig::default();
        assert_eq!(config.jobs, 0);
        assert!(!config.randomize);
        assert_eq!(config.format, FormatMode::Specdoc);
        assert_eq!(config.color, ColorMode::Auto);
        assert!(!config.interrupt.is_triggered());
    }

    #[test]
    fn interrupt_clones_share_the_flag() {
        let interrupt = Interrupt::new();
        let handle = interrupt.clone();
        handle.trigger();
        assert!(interrupt.is_triggered());
    }
}
