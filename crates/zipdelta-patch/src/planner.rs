//! Pre-diff planning
//!
//! Matches every entry of the new archive against the old archive (exact
//! path first, then CRC-32 rename detection), classifies each matched pair
//! into an uncompression recommendation, runs the modifier pipeline, and
//! projects the surviving recommendations into the old/new uncompression
//! plans. Entries with no counterpart are left to the byte-level diff to
//! encode as plain insertions or deletions.

use crate::error::{PatchError, Result};
use crate::plan::PreDiffPlan;
use crate::range::TypedRange;
use crate::recommendation::{
    QualifiedRecommendation, Recommendation, RecommendationModifier, RecommendationReason,
};
use crate::similarity::{Crc32SimilarityFinder, SimilarityFinder};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, trace};
use zipdelta_bsdiff::CancellationToken;
use zipdelta_zip::{DeflateParameters, EntryPath, ZipEntry};

/// Chunk size of the compressed-bytes comparison scan
const COMPARE_BUFFER_SIZE: usize = 4096;

/// Produces the [`PreDiffPlan`] for one old/new archive pair.
pub struct PreDiffPlanner<'a> {
    old_file: &'a Path,
    new_file: &'a Path,
    old_entries_by_path: &'a HashMap<EntryPath, ZipEntry>,
    new_entries_by_path: &'a HashMap<EntryPath, ZipEntry>,
    new_deflate_parameters_by_path: &'a HashMap<EntryPath, Option<DeflateParameters>>,
    modifiers: &'a [Box<dyn RecommendationModifier>],
}

impl<'a> PreDiffPlanner<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        old_file: &'a Path,
        old_entries_by_path: &'a HashMap<EntryPath, ZipEntry>,
        new_file: &'a Path,
        new_entries_by_path: &'a HashMap<EntryPath, ZipEntry>,
        new_deflate_parameters_by_path: &'a HashMap<EntryPath, Option<DeflateParameters>>,
        modifiers: &'a [Box<dyn RecommendationModifier>],
    ) -> Self {
        Self {
            old_file,
            new_file,
            old_entries_by_path,
            new_entries_by_path,
            new_deflate_parameters_by_path,
            modifiers,
        }
    }

    /// Run classification and the modifier pipeline, then freeze the
    /// uncompression plans. Range offsets are still in original-file
    /// offset space.
    pub fn generate_plan(&self, cancel: &CancellationToken) -> Result<PreDiffPlan> {
        let mut recommendations = self.default_recommendations(cancel)?;

        for modifier in self.modifiers {
            recommendations = modifier.modify(self.old_file, self.new_file, recommendations);
        }

        let mut old_file_plan: HashSet<TypedRange<()>> = HashSet::new();
        let mut new_file_plan: HashSet<TypedRange<DeflateParameters>> = HashSet::new();

        for recommendation in &recommendations {
            if recommendation.recommendation.uncompress_old() {
                let old_entry = &recommendation.old_entry;
                old_file_plan.insert(TypedRange::new(
                    old_entry.compressed_data_offset,
                    old_entry.compressed_size,
                    (),
                ));
            }
            if recommendation.recommendation.uncompress_new() {
                let new_entry = &recommendation.new_entry;
                let parameters = self
                    .new_deflate_parameters_by_path
                    .get(&new_entry.path)
                    .copied()
                    .flatten()
                    .ok_or_else(|| {
                        PatchError::InvalidPlan(format!(
                            "no deflate parameters divined for {}",
                            new_entry.path
                        ))
                    })?;
                new_file_plan.insert(TypedRange::new(
                    new_entry.compressed_data_offset,
                    new_entry.compressed_size,
                    parameters,
                ));
            }
        }

        let mut old_file_plan: Vec<_> = old_file_plan.into_iter().collect();
        old_file_plan.sort_by_key(|range| range.offset);
        let mut new_file_plan: Vec<_> = new_file_plan.into_iter().collect();
        new_file_plan.sort_by_key(|range| range.offset);

        debug!(
            "pre-diff plan: {} recommendations, {} old ranges, {} new ranges",
            recommendations.len(),
            old_file_plan.len(),
            new_file_plan.len()
        );

        PreDiffPlan::new(recommendations, old_file_plan, new_file_plan, None)
    }

    fn default_recommendations(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<QualifiedRecommendation>> {
        let mut recommendations = Vec::new();

        let rename_finder =
            Crc32SimilarityFinder::new(self.old_entries_by_path.values().cloned());

        // Iterate in path order so the recommendation list is stable
        // across runs regardless of map iteration order.
        let mut new_paths: Vec<&EntryPath> = self.new_entries_by_path.keys().collect();
        new_paths.sort();

        for new_path in new_paths {
            cancel.check()?;
            let new_entry = &self.new_entries_by_path[new_path];

            let old_entry = match self.old_entries_by_path.get(new_path) {
                Some(entry) => Some(entry.clone()),
                None => rename_finder
                    .find_similar_entries(self.new_file, new_entry)
                    .into_iter()
                    .next(),
            };

            if let Some(old_entry) = old_entry {
                let qualified = self.classify(&old_entry, new_entry)?;
                trace!(
                    "{}: {:?} ({:?})",
                    new_entry.path, qualified.recommendation, qualified.reason
                );
                recommendations.push(qualified);
            }
        }
        Ok(recommendations)
    }

    /// Classify one matched pair. Pure apart from the byte comparison of
    /// the two compressed payloads; re-running it always yields the same
    /// outcome for unchanged inputs.
    fn classify(
        &self,
        old_entry: &ZipEntry,
        new_entry: &ZipEntry,
    ) -> Result<QualifiedRecommendation> {
        let qualified = |recommendation, reason| {
            Ok(QualifiedRecommendation::new(
                old_entry.clone(),
                new_entry.clone(),
                recommendation,
                reason,
            ))
        };

        if self.unsuitable_deflate(new_entry) {
            return qualified(
                Recommendation::UncompressNeither,
                RecommendationReason::DeflateUnsuitable,
            );
        }
        if unsuitable(old_entry, new_entry) {
            return qualified(
                Recommendation::UncompressNeither,
                RecommendationReason::Unsuitable,
            );
        }
        if old_entry.is_stored() && new_entry.is_stored() {
            return qualified(
                Recommendation::UncompressNeither,
                RecommendationReason::BothEntriesUncompressed,
            );
        }
        if old_entry.is_stored() && !new_entry.is_stored() {
            return qualified(
                Recommendation::UncompressNew,
                RecommendationReason::UncompressedChangedToCompressed,
            );
        }
        if new_entry.is_stored() && !old_entry.is_stored() {
            return qualified(
                Recommendation::UncompressOld,
                RecommendationReason::CompressedChangedToUncompressed,
            );
        }
        if self.compressed_bytes_changed(old_entry, new_entry)? {
            return qualified(
                Recommendation::UncompressBoth,
                RecommendationReason::CompressedBytesChanged,
            );
        }
        qualified(
            Recommendation::UncompressNeither,
            RecommendationReason::CompressedBytesIdentical,
        )
    }

    /// The new entry carries a deflate stream whose parameters could not
    /// be divined, so it cannot be recompressed and must stay as-is.
    fn unsuitable_deflate(&self, new_entry: &ZipEntry) -> bool {
        new_entry.is_deflate_compressed()
            && self
                .new_deflate_parameters_by_path
                .get(&new_entry.path)
                .copied()
                .flatten()
                .is_none()
    }

    /// Short-circuiting byte comparison of the two compressed payloads.
    fn compressed_bytes_changed(
        &self,
        old_entry: &ZipEntry,
        new_entry: &ZipEntry,
    ) -> Result<bool> {
        if old_entry.compressed_size != new_entry.compressed_size {
            return Ok(true);
        }

        let mut old_reader = BufReader::new(File::open(self.old_file)?);
        old_reader.seek(SeekFrom::Start(old_entry.compressed_data_offset))?;
        let mut new_reader = BufReader::new(File::open(self.new_file)?);
        new_reader.seek(SeekFrom::Start(new_entry.compressed_data_offset))?;

        let mut old_chunk = [0u8; COMPARE_BUFFER_SIZE];
        let mut new_chunk = [0u8; COMPARE_BUFFER_SIZE];
        let mut remaining = old_entry.compressed_size;
        while remaining > 0 {
            let chunk = remaining.min(COMPARE_BUFFER_SIZE as u64) as usize;
            old_reader.read_exact(&mut old_chunk[..chunk])?;
            new_reader.read_exact(&mut new_chunk[..chunk])?;
            if old_chunk[..chunk] != new_chunk[..chunk] {
                return Ok(true);
            }
            remaining -= chunk as u64;
        }
        Ok(false)
    }
}

/// Either entry uses a compression method the planner cannot reason
/// about: anything that is neither stored nor a real deflate stream.
fn unsuitable(old_entry: &ZipEntry, new_entry: &ZipEntry) -> bool {
    (!old_entry.is_stored() && !old_entry.is_deflate_compressed())
        || (!new_entry.is_stored() && !new_entry.is_deflate_compressed())
}
