//! Failure-details-only formatter.

use std::io;

use super::{write_failures_block, write_footer, FormatCtx, Formatter};

/// Stays quiet while items run and prints only the failure detail block
/// and the summary footer.
pub struct FailedExamples;

impl Formatter for FailedExamples {
    fn on_failures_summary(&mut self, ctx: &mut FormatCtx<'_>) -> io::Result<()> {
        write_failures_block(ctx)
    }

    fn on_footer(&mut self, ctx: &mut FormatCtx<'_>) -> io::Result<()> {
        write_footer(ctx)
    }
}
