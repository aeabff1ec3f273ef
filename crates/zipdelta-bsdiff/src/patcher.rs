//! Patch payload application
//!
//! The inverse of [`crate::writer`]: replays the control/diff/extra stream
//! against the old data to reconstruct the new data. Round-trip
//! verification of generated patches runs through here.

use crate::error::{BsDiffError, Result};
use crate::utils::read_signed_magnitude;
use crate::writer::PAYLOAD_MAGIC;
use byteorder::ReadBytesExt;
use std::io::{Cursor, Read};
use tracing::debug;

/// Apply a diff payload produced by [`crate::writer::generate_patch`] to
/// `old`, returning the reconstructed new data.
pub fn apply_patch(old: &[u8], patch: &[u8]) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(patch);

    let mut magic = [0u8; 16];
    cursor.read_exact(&mut magic)?;
    if &magic != PAYLOAD_MAGIC {
        return Err(BsDiffError::CorruptPatch(format!(
            "bad payload magic: {magic:02X?}"
        )));
    }

    let declared = read_signed_magnitude(&mut cursor)?;
    let new_size = usize::try_from(declared)
        .map_err(|_| BsDiffError::CorruptPatch(format!("negative output size: {declared}")))?;

    let mut output = Vec::with_capacity(new_size);
    let mut old_pos: i64 = 0;

    while output.len() < new_size {
        let diff_length = read_signed_magnitude(&mut cursor)?;
        let extra_length = read_signed_magnitude(&mut cursor)?;
        let seek = read_signed_magnitude(&mut cursor)?;

        if diff_length < 0 || extra_length < 0 {
            return Err(BsDiffError::CorruptPatch(format!(
                "negative control lengths: diff={diff_length}, extra={extra_length}"
            )));
        }
        if output.len() as i64 + diff_length + extra_length > new_size as i64 {
            return Err(BsDiffError::CorruptPatch(
                "control stream exceeds declared output size".to_string(),
            ));
        }

        for _ in 0..diff_length {
            let diff_byte = cursor.read_u8()?;
            let old_byte = if old_pos >= 0 && old_pos < old.len() as i64 {
                old[old_pos as usize]
            } else {
                0
            };
            output.push(old_byte.wrapping_add(diff_byte));
            old_pos += 1;
        }

        if extra_length > 0 {
            let start = output.len();
            output.resize(start + extra_length as usize, 0);
            cursor.read_exact(&mut output[start..])?;
        }

        old_pos += seek;
    }

    if output.len() != new_size {
        return Err(BsDiffError::SizeMismatch {
            expected: new_size,
            actual: output.len(),
        });
    }

    debug!("applied bsdiff payload: output={} bytes", output.len());
    Ok(output)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_magic() {
        let patch = vec![0u8; 32];
        assert!(matches!(
            apply_patch(b"old", &patch),
            Err(BsDiffError::CorruptPatch(_))
        ));
    }

    #[test]
    fn test_rejects_truncated_payload() {
        let mut patch = PAYLOAD_MAGIC.to_vec();
        patch.extend_from_slice(&8i64.to_le_bytes());
        // Declared 8 output bytes but no control stream follows.
        assert!(apply_patch(b"old", &patch).is_err());
    }
}
