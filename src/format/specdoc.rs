//! Nested documentation-style formatter.

use std::io;

use super::{write_failures_block, write_footer, FormatCtx, Formatter};
use crate::outcome::{FailureReason, SourceLocation};
use crate::state::SpecPath;

/// Prints the tree as indented group and requirement lines, colored by
/// outcome, followed by the failure detail block and the summary footer.
pub struct Specdoc {
    depth: usize,
    progress_width: usize,
}

impl Specdoc {
    pub fn new() -> Self {
        Self {
            depth: 0,
            progress_width: 0,
        }
    }

    fn indent(&self) -> String {
        "  ".repeat(self.depth)
    }

    /// Blanks out the transient counter so a shorter result line does not
    /// leave trailing digits behind.
    fn clear_progress(&mut self, ctx: &mut FormatCtx<'_>) -> io::Result<()> {
        if self.progress_width > 0 {
            ctx.write(&" ".repeat(self.progress_width))?;
            ctx.write("\r")?;
            self.progress_width = 0;
        }
        Ok(())
    }
}

impl Default for Specdoc {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for Specdoc {
    fn on_header(&mut self, ctx: &mut FormatCtx<'_>) -> io::Result<()> {
        ctx.blank_line()
    }

    fn on_group_started(
        &mut self,
        ctx: &mut FormatCtx<'_>,
        _path: &[String],
        name: &str,
    ) -> io::Result<()> {
        ctx.write_line(&format!("{}{}", self.indent(), name))?;
        self.depth += 1;
        Ok(())
    }

    fn on_group_done(&mut self, _ctx: &mut FormatCtx<'_>) -> io::Result<()> {
        self.depth = self.depth.saturating_sub(1);
        Ok(())
    }

    fn on_item_progress(
        &mut self,
        ctx: &mut FormatCtx<'_>,
        _location: Option<&SourceLocation>,
        current: usize,
        total: usize,
    ) -> io::Result<()> {
        if ctx.live_progress() {
            let counter = format!("{}/{}", current, total);
            ctx.write(&counter)?;
            ctx.write("\r")?;
            ctx.flush()?;
            self.progress_width = counter.len();
        }
        Ok(())
    }

    fn on_item_succeeded(&mut self, ctx: &mut FormatCtx<'_>, path: &SpecPath) -> io::Result<()> {
        self.clear_progress(ctx)?;
        let line = format!("{}{}", self.indent(), path.requirement);
        ctx.with_success_color(|c| c.write_line(&line))
    }

    fn on_item_failed(
        &mut self,
        ctx: &mut FormatCtx<'_>,
        path: &SpecPath,
        _reason: &FailureReason,
    ) -> io::Result<()> {
        self.clear_progress(ctx)?;
        // The bracketed number matches the entry in the failure block.
        let line = format!(
            "{}{} FAILED [{}]",
            self.indent(),
            path.requirement,
            ctx.failure_count()
        );
        ctx.with_fail_color(|c| c.write_line(&line))
    }

    fn on_item_pending(
        &mut self,
        ctx: &mut FormatCtx<'_>,
        path: &SpecPath,
        reason: Option<&str>,
    ) -> io::Result<()> {
        self.clear_progress(ctx)?;
        let requirement = format!("{}{}", self.indent(), path.requirement);
        let annotation = format!(
            "{}  # PENDING: {}",
            self.indent(),
            reason.unwrap_or("No reason given")
        );
        ctx.with_pending_color(|c| {
            c.write_line(&requirement)?;
            c.write_line(&annotation)
        })
    }

    fn on_failures_summary(&mut self, ctx: &mut FormatCtx<'_>) -> io::Result<()> {
        write_failures_block(ctx)
    }

    fn on_footer(&mut self, ctx: &mut FormatCtx<'_>) -> io::Result<()> {
        write_footer(ctx)
    }
}
