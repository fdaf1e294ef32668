//! Single-character progress formatter.

use std::io;

use super::{write_failures_block, write_footer, FormatCtx, Formatter};
use crate::outcome::FailureReason;
use crate::state::SpecPath;

/// Prints one character per item as results arrive: `.` for success and
/// pending, `F` for failure. Details follow in the failure block.
pub struct Progress {
    row_open: bool,
}

impl Progress {
    pub fn new() -> Self {
        Self { row_open: false }
    }

    fn close_row(&mut self, ctx: &mut FormatCtx<'_>) -> io::Result<()> {
        if self.row_open {
            ctx.blank_line()?;
            self.row_open = false;
        }
        Ok(())
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for Progress {
    fn on_item_succeeded(&mut self, ctx: &mut FormatCtx<'_>, _path: &SpecPath) -> io::Result<()> {
        self.row_open = true;
        ctx.with_success_color(|c| c.write("."))?;
        ctx.flush()
    }

    fn on_item_failed(
        &mut self,
        ctx: &mut FormatCtx<'_>,
        _path: &SpecPath,
        _reason: &FailureReason,
    ) -> io::Result<()> {
        self.row_open = true;
        ctx.with_fail_color(|c| c.write("F"))?;
        ctx.flush()
    }

    fn on_item_pending(
        &mut self,
        ctx: &mut FormatCtx<'_>,
        _path: &SpecPath,
        _reason: Option<&str>,
    ) -> io::Result<()> {
        self.row_open = true;
        ctx.with_pending_color(|c| c.write("."))?;
        ctx.flush()
    }

    fn on_failures_summary(&mut self, ctx: &mut FormatCtx<'_>) -> io::Result<()> {
        self.close_row(ctx)?;
        write_failures_block(ctx)
    }

    fn on_footer(&mut self, ctx: &mut FormatCtx<'_>) -> io::Result<()> {
        self.close_row(ctx)?;
        write_footer(ctx)
    }
}
