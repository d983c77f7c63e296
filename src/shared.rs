//! Shared-span post-processing for version comparison.

use crate::addressing::{Address, VSpan};
use crate::error::Result;

/// A run of identical content: the same material in two places.
pub type SharedSpan = (VSpan, VSpan);

/// Merge runs that continue each other on both sides.
///
/// The backend may report one run of shared content as several adjacent
/// pieces. A pair is folded into the previous output pair when both of its
/// starts equal the previous pair's ends; the previous pair is widened by
/// the current width. Nothing else changes.
///
/// Fails with [`FebeError::Range`](crate::FebeError::Range) if an end or a
/// merged width overflows a digit.
pub fn collapse_sharedspans(
    pairs: impl IntoIterator<Item = SharedSpan>,
) -> Result<Vec<SharedSpan>> {
    let mut result: Vec<SharedSpan> = Vec::new();
    let mut last_ends: Option<(Address, Address)> = None;

    for (a, b) in pairs {
        let ends = (a.end()?, b.end()?);
        let continues = matches!(
            &last_ends,
            Some((end_a, end_b)) if a.start() == *end_a && b.start() == *end_b
        );

        match result.last_mut() {
            Some((prev_a, prev_b)) if continues => {
                prev_a.span.width = (&prev_a.span.width + &a.span.width)?;
                prev_b.span.width = (&prev_b.span.width + &b.span.width)?;
            }
            _ => result.push((a, b)),
        }
        last_ends = Some(ends);
    }

    Ok(result)
}
