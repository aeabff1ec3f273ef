//! Per-entry-pair uncompression recommendations

use std::path::Path;
use zipdelta_zip::ZipEntry;

/// What to inflate before diffing a matched entry pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recommendation {
    /// Inflate the old entry only
    UncompressOld,
    /// Inflate the new entry only
    UncompressNew,
    /// Inflate both entries
    UncompressBoth,
    /// Leave both entries as they are
    UncompressNeither,
}

impl Recommendation {
    /// Whether the old entry's payload should be inflated
    pub fn uncompress_old(self) -> bool {
        matches!(self, Self::UncompressOld | Self::UncompressBoth)
    }

    /// Whether the new entry's payload should be inflated
    pub fn uncompress_new(self) -> bool {
        matches!(self, Self::UncompressNew | Self::UncompressBoth)
    }
}

/// Why a recommendation was chosen. Diagnostic only; carried for
/// observability and for modifier pipelines, with no effect on the patch
/// format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecommendationReason {
    /// The new entry is deflate-compressed but its parameters could not be
    /// divined
    DeflateUnsuitable,
    /// One of the entries uses a compression method the planner cannot
    /// reason about
    Unsuitable,
    /// Both entries are already stored uncompressed
    BothEntriesUncompressed,
    /// The entry went from stored to compressed
    UncompressedChangedToCompressed,
    /// The entry went from compressed to stored
    CompressedChangedToUncompressed,
    /// Both compressed, and the compressed bytes differ
    CompressedBytesChanged,
    /// Both compressed, and the compressed bytes are identical
    CompressedBytesIdentical,
    /// A modifier downgraded the recommendation to bound resource usage
    ResourceConstrained,
}

/// A recommendation qualified with the entry pair it applies to and the
/// rule that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedRecommendation {
    /// The matched entry in the old archive
    pub old_entry: ZipEntry,
    /// The entry in the new archive
    pub new_entry: ZipEntry,
    /// What to inflate
    pub recommendation: Recommendation,
    /// Why
    pub reason: RecommendationReason,
}

impl QualifiedRecommendation {
    pub fn new(
        old_entry: ZipEntry,
        new_entry: ZipEntry,
        recommendation: Recommendation,
        reason: RecommendationReason,
    ) -> Self {
        Self {
            old_entry,
            new_entry,
            recommendation,
            reason,
        }
    }
}

/// External policy hook over the planner's default classification.
///
/// Modifiers run as an ordered pipeline; each receives the full
/// recommendation list plus both original files and returns the list to
/// use instead.
pub trait RecommendationModifier {
    fn modify(
        &self,
        old_file: &Path,
        new_file: &Path,
        recommendations: Vec<QualifiedRecommendation>,
    ) -> Vec<QualifiedRecommendation>;
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_per_side_projection() {
        assert!(Recommendation::UncompressOld.uncompress_old());
        assert!(!Recommendation::UncompressOld.uncompress_new());
        assert!(!Recommendation::UncompressNew.uncompress_old());
        assert!(Recommendation::UncompressNew.uncompress_new());
        assert!(Recommendation::UncompressBoth.uncompress_old());
        assert!(Recommendation::UncompressBoth.uncompress_new());
        assert!(!Recommendation::UncompressNeither.uncompress_old());
        assert!(!Recommendation::UncompressNeither.uncompress_new());
    }
}
