//! Line-diff rendering for comparison failures.

use std::io;

use difference::{Changeset, Difference};

use super::FormatCtx;

const LABEL_EXPECTED: &str = "     expected: ";
const LABEL_BUT_GOT: &str = "      but got: ";
const INDENT_COMMON: &str = "               ";

/// Writes an `expected / but got` block for a comparison failure.
///
/// The two values are diffed line by line: lines common to both sides are
/// printed once and unlabeled, lines only in `expected` carry the
/// `expected:` label in the success color, lines only in `actual` carry
/// the `but got:` label in the failure color.
pub(crate) fn write_expected_but_got(
    ctx: &mut FormatCtx<'_>,
    preface: Option<&str>,
    expected: &str,
    actual: &str,
) -> io::Result<()> {
    if let Some(preface) = preface {
        for line in preface.lines() {
            ctx.write_line(&format!("     {}", line))?;
        }
    }

    let changeset = Changeset::new(expected, actual, "\n");
    for difference in &changeset.diffs {
        match difference {
            Difference::Same(block) => {
                for line in block.lines() {
                    ctx.write_line(&format!("{}{}", INDENT_COMMON, line))?;
                }
            }
            Difference::Rem(block) => {
                for line in block.lines() {
                    let rendered = format!("{}{}", LABEL_EXPECTED, line);
                    ctx.with_success_color(|c| c.write_line(&rendered))?;
                }
            }
            Difference::Add(block) => {
                for line in block.lines() {
                    let rendered = format!("{}{}", LABEL_BUT_GOT, line);
                    ctx.with_fail_color(|c| c.write_line(&rendered))?;
                }
            }
        }
    }
    Ok(())
}
