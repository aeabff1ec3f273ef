//! Patch payload generation
//!
//! Consumes the matcher's anchor sequence and both byte streams, and emits
//! the control/diff/extra payload. Between consecutive anchors the previous
//! match is extended forward and the next match backward, scoring ±1 per
//! matching/mismatching byte and keeping the best cumulative score; any
//! overlap between the two extensions is then reconciled the same way so
//! adjacent entries never double-cover a new-data byte.

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::matcher::BsDiffMatcher;
use crate::suffix::group_array;
use crate::utils::write_signed_magnitude;
use std::io::Write;
use tracing::debug;

/// Magic prefix of the diff payload
pub const PAYLOAD_MAGIC: &[u8; 16] = b"ENDSLEY/BSDIFF43";

/// Minimum match length used when none is given. Larger values speed up
/// generation and shrink the control stream at the cost of missing short
/// matches.
const DEFAULT_MINIMUM_MATCH_LENGTH: usize = 16;

/// Generate a diff payload transforming `old` into `new`, using the
/// default minimum match length.
pub fn generate_patch<W: Write>(
    old: &[u8],
    new: &[u8],
    out: &mut W,
    cancel: &CancellationToken,
) -> Result<()> {
    generate_patch_with_match_length(old, new, out, cancel, DEFAULT_MINIMUM_MATCH_LENGTH)
}

/// Generate a diff payload with an explicit minimum match length.
pub fn generate_patch_with_match_length<W: Write>(
    old: &[u8],
    new: &[u8],
    out: &mut W,
    cancel: &CancellationToken,
    minimum_match_length: usize,
) -> Result<()> {
    debug!(
        "generating bsdiff payload: old={} bytes, new={} bytes",
        old.len(),
        new.len()
    );

    out.write_all(PAYLOAD_MAGIC)?;
    write_signed_magnitude(new.len() as i64, out)?;

    let group = group_array(old)?;
    let mut matcher = BsDiffMatcher::new(old, new, &group, minimum_match_length, cancel);
    generate_with_matcher(old, new, &mut matcher, out, cancel)
}

fn generate_with_matcher<W: Write>(
    old: &[u8],
    new: &[u8],
    matcher: &mut BsDiffMatcher<'_>,
    out: &mut W,
    cancel: &CancellationToken,
) -> Result<()> {
    let old_size = old.len() as i64;
    let new_size = new.len() as i64;

    let mut last_new_position: i64 = 0;
    let mut last_old_position: i64 = 0;
    let mut new_position: i64 = 0;
    let mut old_position: i64 = 0;

    while new_position < new_size {
        cancel.check()?;

        match matcher.next_match()? {
            Some(anchor) => {
                new_position = anchor.new_position as i64;
                old_position = anchor.old_position as i64;
            }
            None => new_position = new_size,
        }

        // Extend the next match backward from its anchor.
        let mut backward_extension: i64 = 0;
        if new_position < new_size {
            let mut score: i64 = 0;
            let mut best_score: i64 = 0;
            let mut i: i64 = 1;
            while new_position - i >= last_new_position && old_position >= i {
                if old[(old_position - i) as usize] == new[(new_position - i) as usize] {
                    score += 1;
                } else {
                    score -= 1;
                }
                if score > best_score {
                    best_score = score;
                    backward_extension = i;
                }
                i += 1;
            }
        }

        // Extend the previous match forward from its end.
        let mut forward_extension: i64 = 0;
        {
            let mut score: i64 = 0;
            let mut best_score: i64 = 0;
            let mut i: i64 = 0;
            while last_new_position + i < new_position && last_old_position + i < old_size {
                if old[(last_old_position + i) as usize] == new[(last_new_position + i) as usize] {
                    score += 1;
                } else {
                    score -= 1;
                }
                if score > best_score {
                    best_score = score;
                    forward_extension = i + 1;
                }
                i += 1;
            }
        }

        // The extensions may cover the same new-data bytes; settle the
        // boundary at the best-scoring split point.
        let overlap = (last_new_position + forward_extension) - (new_position - backward_extension);
        if overlap > 0 {
            let mut score: i64 = 0;
            let mut best_score: i64 = 0;
            let mut backward_extension_decrement: i64 = 0;
            for i in 0..overlap {
                let fwd = forward_extension - overlap + i;
                if new[(last_new_position + fwd) as usize] == old[(last_old_position + fwd) as usize]
                {
                    score += 1;
                }
                let bwd = i - backward_extension;
                if new[(new_position + bwd) as usize] == old[(old_position + bwd) as usize] {
                    score -= 1;
                }
                if score > best_score {
                    best_score = score;
                    backward_extension_decrement = i + 1;
                }
            }
            forward_extension -= overlap - backward_extension_decrement;
            backward_extension -= backward_extension_decrement;
        }

        let old_position_offset = if new_position < new_size {
            (old_position - backward_extension) - (last_old_position + forward_extension)
        } else {
            0
        };
        let new_no_match_length =
            (new_position - backward_extension) - (last_new_position + forward_extension);

        write_entry(
            new,
            old,
            last_new_position,
            last_old_position,
            forward_extension,
            new_no_match_length,
            old_position_offset,
            out,
        )?;

        last_new_position = new_position - backward_extension;
        last_old_position = old_position - backward_extension;
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn write_entry<W: Write>(
    new: &[u8],
    old: &[u8],
    new_position: i64,
    old_position: i64,
    diff_length: i64,
    extra_length: i64,
    old_position_offset_for_next_entry: i64,
    out: &mut W,
) -> Result<()> {
    write_signed_magnitude(diff_length, out)?;
    write_signed_magnitude(extra_length, out)?;
    write_signed_magnitude(old_position_offset_for_next_entry, out)?;

    let new_start = new_position as usize;
    let old_start = old_position as usize;
    let diff: Vec<u8> = new[new_start..new_start + diff_length as usize]
        .iter()
        .zip(&old[old_start..old_start + diff_length as usize])
        .map(|(n, o)| n.wrapping_sub(*o))
        .collect();
    out.write_all(&diff)?;

    if extra_length > 0 {
        let extra_start = new_start + diff_length as usize;
        out.write_all(&new[extra_start..extra_start + extra_length as usize])?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::BsDiffError;
    use crate::utils::read_signed_magnitude;
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Read};

    #[test]
    fn test_payload_header_layout() {
        let mut payload = Vec::new();
        let cancel = CancellationToken::new();
        generate_patch(b"old data", b"new data", &mut payload, &cancel).unwrap();

        let mut cursor = Cursor::new(payload);
        let mut magic = [0u8; 16];
        cursor.read_exact(&mut magic).unwrap();
        assert_eq!(&magic, PAYLOAD_MAGIC);
        assert_eq!(read_signed_magnitude(&mut cursor).unwrap(), 8);
    }

    #[test]
    fn test_empty_new_is_header_only() {
        let mut payload = Vec::new();
        let cancel = CancellationToken::new();
        generate_patch(b"old data", b"", &mut payload, &cancel).unwrap();

        // Just the magic and the zero length; the writer loop never runs.
        assert_eq!(payload.len(), 24);
    }

    #[test]
    fn test_cancellation_surfaces() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut payload = Vec::new();
        let result = generate_patch(&[1u8; 64], &[2u8; 64], &mut payload, &cancel);
        assert!(matches!(result, Err(BsDiffError::Cancelled(_))));
    }
}
