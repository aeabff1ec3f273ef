//! Patch container serialization
//!
//! Writes the self-describing patch file: identifier, flags, the old-file
//! uncompression plan, the new-file recompression plan, the delta-format
//! table, and the raw diff payload. All multi-byte fields are
//! little-endian.
//!
//! ```text
//! Patch file:
//! ├── Identifier: "GFbFv1_0" (8 bytes, ASCII)
//! ├── Flags (4 bytes, reserved, 0)
//! ├── Delta-friendly old file size (8 bytes)
//! ├── Old-file uncompression plan
//! │   ├── Count (4 bytes)
//! │   └── Per range: offset (8 bytes), length (8 bytes)
//! ├── New-file recompression plan
//! │   ├── Count (4 bytes)
//! │   └── Per range: offset (8 bytes), length (8 bytes),
//! │       compatibility window id (4 bytes), deflate level (4 bytes),
//! │       strategy (4 bytes), nowrap flag (4 bytes)
//! ├── Delta format table
//! │   ├── Count (4 bytes, always 1)
//! │   └── Format id (4 bytes, 0 = bsdiff), old region start/length
//! │       (8 + 8 bytes), new region start/length (8 + 8 bytes)
//! ├── Diff payload length (8 bytes)
//! └── Diff payload (raw bsdiff stream)
//! ```

use crate::error::{PatchError, Result};
use crate::plan::PreDiffPlan;
use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;
use tracing::debug;

/// ASCII identifier opening every patch file
pub const PATCH_IDENTIFIER: &[u8; 8] = b"GFbFv1_0";

/// Compatibility window for entries recompressible with a standard
/// zlib-style deflater
pub const COMPATIBILITY_WINDOW_DEFAULT_DEFLATE: u32 = 0;

/// Delta format id of the bsdiff payload
pub const DELTA_FORMAT_BSDIFF: u32 = 0;

/// Serializes a finalized plan plus the diff payload into one patch file.
pub struct PatchWriter<'a> {
    plan: &'a PreDiffPlan,
    delta_friendly_old_file_size: u64,
    delta_friendly_new_file_size: u64,
    delta_file: &'a Path,
}

impl<'a> PatchWriter<'a> {
    pub fn new(
        plan: &'a PreDiffPlan,
        delta_friendly_old_file_size: u64,
        delta_friendly_new_file_size: u64,
        delta_file: &'a Path,
    ) -> Self {
        Self {
            plan,
            delta_friendly_old_file_size,
            delta_friendly_new_file_size,
            delta_file,
        }
    }

    /// Write the complete patch to `out`.
    pub fn write_patch<W: Write>(&self, out: &mut W) -> Result<()> {
        let recompression_plan = self
            .plan
            .delta_friendly_new_file_recompression_plan()
            .ok_or_else(|| {
                PatchError::InvalidPlan(
                    "recompression plan not materialized; run the executor with \
                     delta-friendly outputs first"
                        .to_string(),
                )
            })?;

        out.write_all(PATCH_IDENTIFIER)?;
        out.write_u32::<LittleEndian>(0)?; // flags, reserved
        out.write_u64::<LittleEndian>(self.delta_friendly_old_file_size)?;

        let old_plan = self.plan.old_file_uncompression_plan();
        out.write_u32::<LittleEndian>(old_plan.len() as u32)?;
        for range in old_plan {
            out.write_u64::<LittleEndian>(range.offset)?;
            out.write_u64::<LittleEndian>(range.length)?;
        }

        out.write_u32::<LittleEndian>(recompression_plan.len() as u32)?;
        for range in recompression_plan {
            out.write_u64::<LittleEndian>(range.offset)?;
            out.write_u64::<LittleEndian>(range.length)?;
            out.write_u32::<LittleEndian>(COMPATIBILITY_WINDOW_DEFAULT_DEFLATE)?;
            out.write_u32::<LittleEndian>(u32::from(range.metadata.level))?;
            out.write_u32::<LittleEndian>(u32::from(range.metadata.strategy))?;
            out.write_u32::<LittleEndian>(u32::from(range.metadata.nowrap))?;
        }

        // Single-entry delta format table covering both delta-friendly
        // files end to end.
        out.write_u32::<LittleEndian>(1)?;
        out.write_u32::<LittleEndian>(DELTA_FORMAT_BSDIFF)?;
        out.write_u64::<LittleEndian>(0)?;
        out.write_u64::<LittleEndian>(self.delta_friendly_old_file_size)?;
        out.write_u64::<LittleEndian>(0)?;
        out.write_u64::<LittleEndian>(self.delta_friendly_new_file_size)?;

        let payload_length = std::fs::metadata(self.delta_file)?.len();
        out.write_u64::<LittleEndian>(payload_length)?;
        let mut payload = BufReader::new(File::open(self.delta_file)?);
        let copied = io::copy(&mut payload, out)?;
        if copied != payload_length {
            return Err(PatchError::InvalidPlan(format!(
                "delta payload changed size while serializing: {copied} of {payload_length} bytes"
            )));
        }

        out.flush()?;
        debug!(
            "patch written: {} old ranges, {} recompression ranges, {} payload bytes",
            old_plan.len(),
            recompression_plan.len(),
            payload_length
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::range::TypedRange;
    use byteorder::ReadBytesExt;
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Read};
    use zipdelta_zip::DeflateParameters;

    #[test]
    fn test_container_layout() {
        let params = DeflateParameters::of(9, 1, true).unwrap();
        let plan = PreDiffPlan::new(
            Vec::new(),
            vec![TypedRange::new(100, 50, ())],
            vec![TypedRange::new(200, 60, params)],
            Some(vec![TypedRange::new(300, 70, params)]),
        )
        .unwrap();

        let mut delta_file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut delta_file, b"PAYLOAD").unwrap();
        delta_file.flush().unwrap();

        let mut patch = Vec::new();
        PatchWriter::new(&plan, 1111, 2222, delta_file.path())
            .write_patch(&mut patch)
            .unwrap();

        let mut cursor = Cursor::new(patch);
        let mut identifier = [0u8; 8];
        cursor.read_exact(&mut identifier).unwrap();
        assert_eq!(&identifier, PATCH_IDENTIFIER);
        assert_eq!(cursor.read_u32::<LittleEndian>().unwrap(), 0); // flags
        assert_eq!(cursor.read_u64::<LittleEndian>().unwrap(), 1111);

        // Old-file uncompression plan
        assert_eq!(cursor.read_u32::<LittleEndian>().unwrap(), 1);
        assert_eq!(cursor.read_u64::<LittleEndian>().unwrap(), 100);
        assert_eq!(cursor.read_u64::<LittleEndian>().unwrap(), 50);

        // Recompression plan
        assert_eq!(cursor.read_u32::<LittleEndian>().unwrap(), 1);
        assert_eq!(cursor.read_u64::<LittleEndian>().unwrap(), 300);
        assert_eq!(cursor.read_u64::<LittleEndian>().unwrap(), 70);
        assert_eq!(
            cursor.read_u32::<LittleEndian>().unwrap(),
            COMPATIBILITY_WINDOW_DEFAULT_DEFLATE
        );
        assert_eq!(cursor.read_u32::<LittleEndian>().unwrap(), 9); // level
        assert_eq!(cursor.read_u32::<LittleEndian>().unwrap(), 1); // strategy
        assert_eq!(cursor.read_u32::<LittleEndian>().unwrap(), 1); // nowrap

        // Delta format table
        assert_eq!(cursor.read_u32::<LittleEndian>().unwrap(), 1);
        assert_eq!(cursor.read_u32::<LittleEndian>().unwrap(), DELTA_FORMAT_BSDIFF);
        assert_eq!(cursor.read_u64::<LittleEndian>().unwrap(), 0);
        assert_eq!(cursor.read_u64::<LittleEndian>().unwrap(), 1111);
        assert_eq!(cursor.read_u64::<LittleEndian>().unwrap(), 0);
        assert_eq!(cursor.read_u64::<LittleEndian>().unwrap(), 2222);

        // Payload
        assert_eq!(cursor.read_u64::<LittleEndian>().unwrap(), 7);
        let mut payload = Vec::new();
        cursor.read_to_end(&mut payload).unwrap();
        assert_eq!(payload, b"PAYLOAD");
    }

    #[test]
    fn test_missing_recompression_plan_rejected() {
        let plan = PreDiffPlan::new(Vec::new(), Vec::new(), Vec::new(), None).unwrap();
        let delta_file = tempfile::NamedTempFile::new().unwrap();
        let mut patch = Vec::new();
        let result =
            PatchWriter::new(&plan, 0, 0, delta_file.path()).write_patch(&mut patch);
        assert!(matches!(result, Err(PatchError::InvalidPlan(_))));
    }
}
