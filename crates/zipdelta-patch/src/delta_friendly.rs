//! Delta-friendly file generation
//!
//! Rewrites a source stream so that every planned range is replaced by its
//! inflated content while everything else is copied verbatim. The returned
//! inverse plan locates each inflated region in the output stream, still
//! carrying the metadata needed to compress it back.

use crate::error::{PatchError, Result};
use crate::range::TypedRange;
use flate2::read::DeflateDecoder;
use std::io::{self, Read, Write};
use tracing::trace;

/// Copy `input` to `out`, inflating every range of `plan`.
///
/// `plan` must be sorted ascending by offset with no overlaps, and `input`
/// must be positioned at offset zero. A pure function of the input bytes
/// and the plan.
pub fn write_delta_friendly_file<T, R, W>(
    plan: &[TypedRange<T>],
    input: &mut R,
    out: &mut W,
) -> Result<Vec<TypedRange<T>>>
where
    T: Copy,
    R: Read,
    W: Write,
{
    let mut inverse_plan = Vec::with_capacity(plan.len());
    let mut input_offset: u64 = 0;
    let mut output_offset: u64 = 0;

    for range in plan {
        if range.offset < input_offset {
            return Err(PatchError::InvalidPlan(format!(
                "range at offset {} overlaps the previous range ending at {}",
                range.offset, input_offset
            )));
        }

        // Verbatim span up to the start of the range.
        let gap = range.offset - input_offset;
        let copied = io::copy(&mut input.by_ref().take(gap), out)?;
        if copied != gap {
            return Err(PatchError::InvalidPlan(format!(
                "range at offset {} lies beyond the end of the input",
                range.offset
            )));
        }
        input_offset += gap;
        output_offset += gap;

        // Inflate exactly range.length compressed bytes.
        let mut compressed = input.by_ref().take(range.length);
        let inflated = {
            let mut decoder = DeflateDecoder::new(&mut compressed);
            io::copy(&mut decoder, out)?
        };
        // The decoder stops at the end of the deflate stream; consume any
        // remaining bytes of the range so the input stays positioned.
        io::copy(&mut compressed, &mut io::sink())?;

        trace!(
            "inflated range at {} ({} -> {} bytes)",
            range.offset, range.length, inflated
        );
        inverse_plan.push(TypedRange::new(output_offset, inflated, range.metadata));
        input_offset += range.length;
        output_offset += inflated;
    }

    // Trailing verbatim span.
    io::copy(input, out)?;
    Ok(inverse_plan)
}
