//! End-to-end plan preparation
//!
//! Drives the full pre-diff phase: list and divine the entries of both
//! archives, run the planner, and (when output paths are configured)
//! materialize the delta-friendly files, folding the resulting
//! recompression plan back into the final [`PreDiffPlan`].

use crate::delta_friendly::write_delta_friendly_file;
use crate::error::Result;
use crate::plan::PreDiffPlan;
use crate::planner::PreDiffPlanner;
use crate::range::TypedRange;
use crate::recommendation::RecommendationModifier;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;
use zipdelta_bsdiff::CancellationToken;
use zipdelta_zip::{DeflateDiviner, DeflateParameters, EntryLister, EntryPath, ZipEntry};

/// Immutable configuration for one pre-diff run.
///
/// The original archives are always required; the delta-friendly output
/// paths come as an optional pair so that a plan-only run cannot be
/// configured with just one of them.
pub struct PreDiffExecutor<'a> {
    original_old_file: &'a Path,
    original_new_file: &'a Path,
    delta_friendly_output: Option<(&'a Path, &'a Path)>,
    lister: &'a dyn EntryLister,
    diviner: &'a dyn DeflateDiviner,
    modifiers: &'a [Box<dyn RecommendationModifier>],
}

impl<'a> PreDiffExecutor<'a> {
    pub fn new(
        original_old_file: &'a Path,
        original_new_file: &'a Path,
        delta_friendly_output: Option<(&'a Path, &'a Path)>,
        lister: &'a dyn EntryLister,
        diviner: &'a dyn DeflateDiviner,
        modifiers: &'a [Box<dyn RecommendationModifier>],
    ) -> Self {
        Self {
            original_old_file,
            original_new_file,
            delta_friendly_output,
            lister,
            diviner,
            modifiers,
        }
    }

    /// Prepare everything needed for diffing.
    ///
    /// With delta-friendly output paths configured the returned plan also
    /// carries the recompression plan; otherwise it stops at the
    /// uncompression plans in original offset space.
    pub fn prepare_for_diffing(&self, cancel: &CancellationToken) -> Result<PreDiffPlan> {
        let plan = self.generate_pre_diff_plan(cancel)?;

        if let Some((delta_friendly_old, delta_friendly_new)) = self.delta_friendly_output {
            cancel.check()?;
            let recompression_plan =
                self.generate_delta_friendly_files(&plan, delta_friendly_old, delta_friendly_new)?;
            return plan.with_recompression_plan(recompression_plan);
        }
        Ok(plan)
    }

    fn generate_pre_diff_plan(&self, cancel: &CancellationToken) -> Result<PreDiffPlan> {
        let mut old_entries_by_path: HashMap<EntryPath, ZipEntry> = HashMap::new();
        for entry in self.lister.list_entries(self.original_old_file)? {
            old_entries_by_path.insert(entry.path.clone(), entry);
        }

        let mut new_entries_by_path: HashMap<EntryPath, ZipEntry> = HashMap::new();
        let mut new_parameters_by_path: HashMap<EntryPath, Option<DeflateParameters>> =
            HashMap::new();
        for divined in self.diviner.divine_parameters(self.original_new_file)? {
            new_parameters_by_path.insert(divined.entry.path.clone(), divined.parameters);
            new_entries_by_path.insert(divined.entry.path.clone(), divined.entry);
        }

        debug!(
            "listed {} old entries, {} new entries",
            old_entries_by_path.len(),
            new_entries_by_path.len()
        );

        PreDiffPlanner::new(
            self.original_old_file,
            &old_entries_by_path,
            self.original_new_file,
            &new_entries_by_path,
            &new_parameters_by_path,
            self.modifiers,
        )
        .generate_plan(cancel)
    }

    /// Write both delta-friendly files and return the recompression plan
    /// for the new one. The old file's inverse plan is discarded; the
    /// delta-friendly old file only exists to be diffed against.
    fn generate_delta_friendly_files(
        &self,
        plan: &PreDiffPlan,
        delta_friendly_old: &Path,
        delta_friendly_new: &Path,
    ) -> Result<Vec<TypedRange<DeflateParameters>>> {
        {
            let mut input = BufReader::new(File::open(self.original_old_file)?);
            let mut out = BufWriter::new(File::create(delta_friendly_old)?);
            write_delta_friendly_file(plan.old_file_uncompression_plan(), &mut input, &mut out)?;
            out.flush()?;
        }

        let mut input = BufReader::new(File::open(self.original_new_file)?);
        let mut out = BufWriter::new(File::create(delta_friendly_new)?);
        let recompression_plan =
            write_delta_friendly_file(plan.new_file_uncompression_plan(), &mut input, &mut out)?;
        out.flush()?;

        debug!(
            "delta-friendly files written, {} recompression ranges",
            recompression_plan.len()
        );
        Ok(recompression_plan)
    }
}
