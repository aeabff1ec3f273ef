//! Archive patch generation pipeline
//!
//! Ties everything together: prepare the delta-friendly files, run the
//! diff engine over them, and serialize the patch container. All
//! intermediates live in scoped temp files that are removed on every exit
//! path, including errors and cancellation.

use crate::error::{PatchError, Result};
use crate::executor::PreDiffExecutor;
use crate::patch_writer::PatchWriter;
use crate::plan::PreDiffPlan;
use crate::recommendation::RecommendationModifier;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use zipdelta_bsdiff::{ByteSource, CancellationToken, generate_patch_with_match_length};
use zipdelta_zip::{DeflateDiviner, EntryLister};

/// Generates a delta between two delta-friendly blobs.
pub trait DeltaGenerator {
    fn generate_delta(
        &self,
        old_blob: &Path,
        new_blob: &Path,
        out: &mut dyn Write,
        cancel: &CancellationToken,
    ) -> Result<()>;
}

/// Delta format 0: the bsdiff engine.
pub struct BsDiffDeltaGenerator;

/// Minimum match length handed to the bsdiff engine
const MATCH_LENGTH_BYTES: usize = 16;

impl DeltaGenerator for BsDiffDeltaGenerator {
    fn generate_delta(
        &self,
        old_blob: &Path,
        new_blob: &Path,
        mut out: &mut dyn Write,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let old = ByteSource::from_file(old_blob)?;
        let new = ByteSource::from_file(new_blob)?;
        generate_patch_with_match_length(&old, &new, &mut out, cancel, MATCH_LENGTH_BYTES)?;
        Ok(())
    }
}

/// The full archive-to-archive patch pipeline.
pub struct ArchivePatchGenerator<'a> {
    lister: &'a dyn EntryLister,
    diviner: &'a dyn DeflateDiviner,
    modifiers: Vec<Box<dyn RecommendationModifier>>,
}

impl<'a> ArchivePatchGenerator<'a> {
    pub fn new(
        lister: &'a dyn EntryLister,
        diviner: &'a dyn DeflateDiviner,
        modifiers: Vec<Box<dyn RecommendationModifier>>,
    ) -> Self {
        Self {
            lister,
            diviner,
            modifiers,
        }
    }

    /// Generate a patch transforming `old_file` into `new_file`, writing
    /// the container to `out`.
    pub fn generate_patch<W: Write>(
        &self,
        old_file: &Path,
        new_file: &Path,
        out: &mut W,
        cancel: &CancellationToken,
    ) -> Result<()> {
        info!("generating patch: {:?} -> {:?}", old_file, new_file);

        let delta_friendly_old = NamedTempFile::new()?;
        let delta_friendly_new = NamedTempFile::new()?;

        let executor = PreDiffExecutor::new(
            old_file,
            new_file,
            Some((delta_friendly_old.path(), delta_friendly_new.path())),
            self.lister,
            self.diviner,
            &self.modifiers,
        );
        let plan = executor.prepare_for_diffing(cancel)?;

        let delta_file = NamedTempFile::new()?;
        {
            let mut delta_out = BufWriter::new(delta_file.as_file());
            BsDiffDeltaGenerator.generate_delta(
                delta_friendly_old.path(),
                delta_friendly_new.path(),
                &mut delta_out,
                cancel,
            )?;
            delta_out.flush()?;
        }

        let delta_friendly_old_size = fs::metadata(delta_friendly_old.path())?.len();
        let delta_friendly_new_size = fs::metadata(delta_friendly_new.path())?.len();
        debug!(
            "delta-friendly sizes: old={} bytes, new={} bytes",
            delta_friendly_old_size, delta_friendly_new_size
        );

        cancel.check()?;
        PatchWriter::new(
            &plan,
            delta_friendly_old_size,
            delta_friendly_new_size,
            delta_file.path(),
        )
        .write_patch(out)
    }

    /// Generate a patch directly to `patch_file`.
    ///
    /// The patch is staged in a temp file beside the target and only
    /// persisted on success, so a failed run leaves no partial artifact.
    pub fn generate_patch_to_file(
        &self,
        old_file: &Path,
        new_file: &Path,
        patch_file: &Path,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let target_dir = patch_file
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let staged = NamedTempFile::new_in(target_dir)?;
        {
            let mut out = BufWriter::new(staged.as_file());
            self.generate_patch(old_file, new_file, &mut out, cancel)?;
            out.flush()?;
        }
        staged
            .persist(patch_file)
            .map_err(|persist| PatchError::Io(persist.error))?;
        Ok(())
    }

    /// Run only the pre-diff phase and return the finalized plan,
    /// including the recompression plan. Delta-friendly intermediates are
    /// created in temp files and discarded.
    pub fn generate_plan(
        &self,
        old_file: &Path,
        new_file: &Path,
        cancel: &CancellationToken,
    ) -> Result<PreDiffPlan> {
        let delta_friendly_old = NamedTempFile::new()?;
        let delta_friendly_new = NamedTempFile::new()?;
        let executor = PreDiffExecutor::new(
            old_file,
            new_file,
            Some((delta_friendly_old.path(), delta_friendly_new.path())),
            self.lister,
            self.diviner,
            &self.modifiers,
        );
        executor.prepare_for_diffing(cancel)
    }
}
