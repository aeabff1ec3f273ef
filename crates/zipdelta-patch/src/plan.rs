//! The finalized pre-diff plan

use crate::error::{PatchError, Result};
use crate::range::TypedRange;
use crate::recommendation::QualifiedRecommendation;
use zipdelta_zip::DeflateParameters;

/// Everything the patch writer needs to know about how the delta-friendly
/// files were (or will be) derived from the originals.
///
/// The uncompression plans are in original-file offset space. The
/// recompression plan is in delta-friendly-new-file offset space and stays
/// `None` until the delta-friendly files have actually been materialized.
#[derive(Debug, Clone)]
pub struct PreDiffPlan {
    qualified_recommendations: Vec<QualifiedRecommendation>,
    old_file_uncompression_plan: Vec<TypedRange<()>>,
    new_file_uncompression_plan: Vec<TypedRange<DeflateParameters>>,
    delta_friendly_new_file_recompression_plan: Option<Vec<TypedRange<DeflateParameters>>>,
}

impl PreDiffPlan {
    /// Create a plan, validating that every range vector is sorted
    /// ascending by offset.
    pub fn new(
        qualified_recommendations: Vec<QualifiedRecommendation>,
        old_file_uncompression_plan: Vec<TypedRange<()>>,
        new_file_uncompression_plan: Vec<TypedRange<DeflateParameters>>,
        delta_friendly_new_file_recompression_plan: Option<Vec<TypedRange<DeflateParameters>>>,
    ) -> Result<Self> {
        ensure_ordered(&old_file_uncompression_plan, "old file uncompression plan")?;
        ensure_ordered(&new_file_uncompression_plan, "new file uncompression plan")?;
        if let Some(recompression_plan) = &delta_friendly_new_file_recompression_plan {
            ensure_ordered(recompression_plan, "recompression plan")?;
        }
        Ok(Self {
            qualified_recommendations,
            old_file_uncompression_plan,
            new_file_uncompression_plan,
            delta_friendly_new_file_recompression_plan,
        })
    }

    /// Rebuild this plan with the recompression plan produced while
    /// materializing the delta-friendly files.
    pub fn with_recompression_plan(
        self,
        recompression_plan: Vec<TypedRange<DeflateParameters>>,
    ) -> Result<Self> {
        Self::new(
            self.qualified_recommendations,
            self.old_file_uncompression_plan,
            self.new_file_uncompression_plan,
            Some(recompression_plan),
        )
    }

    /// The per-pair recommendations the plans were projected from
    pub fn qualified_recommendations(&self) -> &[QualifiedRecommendation] {
        &self.qualified_recommendations
    }

    /// Ranges of the old file to inflate, in original offset space
    pub fn old_file_uncompression_plan(&self) -> &[TypedRange<()>] {
        &self.old_file_uncompression_plan
    }

    /// Ranges of the new file to inflate, in original offset space
    pub fn new_file_uncompression_plan(&self) -> &[TypedRange<DeflateParameters>] {
        &self.new_file_uncompression_plan
    }

    /// Ranges of the delta-friendly new file to recompress, once known
    pub fn delta_friendly_new_file_recompression_plan(
        &self,
    ) -> Option<&[TypedRange<DeflateParameters>]> {
        self.delta_friendly_new_file_recompression_plan.as_deref()
    }
}

fn ensure_ordered<T>(ranges: &[TypedRange<T>], what: &str) -> Result<()> {
    for pair in ranges.windows(2) {
        if pair[0].offset > pair[1].offset {
            return Err(PatchError::InvalidPlan(format!(
                "{what} not sorted: offset {} precedes offset {}",
                pair[1].offset, pair[0].offset
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn params() -> DeflateParameters {
        DeflateParameters::of(6, 0, true).unwrap()
    }

    #[test]
    fn test_sorted_plans_accepted() {
        let plan = PreDiffPlan::new(
            Vec::new(),
            vec![TypedRange::new(0, 10, ()), TypedRange::new(20, 10, ())],
            vec![
                TypedRange::new(5, 10, params()),
                TypedRange::new(40, 10, params()),
            ],
            None,
        );
        assert!(plan.is_ok());
    }

    #[test]
    fn test_out_of_order_plan_rejected() {
        let plan = PreDiffPlan::new(
            Vec::new(),
            vec![TypedRange::new(20, 10, ()), TypedRange::new(0, 10, ())],
            Vec::new(),
            None,
        );
        assert!(matches!(plan, Err(PatchError::InvalidPlan(_))));
    }

    #[test]
    fn test_out_of_order_recompression_plan_rejected() {
        let plan = PreDiffPlan::new(
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Some(vec![
                TypedRange::new(9, 1, params()),
                TypedRange::new(3, 1, params()),
            ]),
        );
        assert!(matches!(plan, Err(PatchError::InvalidPlan(_))));
    }

    #[test]
    fn test_duplicate_offsets_accepted() {
        let plan = PreDiffPlan::new(
            Vec::new(),
            vec![TypedRange::new(10, 5, ()), TypedRange::new(10, 5, ())],
            Vec::new(),
            None,
        );
        assert!(plan.is_ok());
    }

    #[test]
    fn test_empty_plans_accepted() {
        assert!(PreDiffPlan::new(Vec::new(), Vec::new(), Vec::new(), None).is_ok());
    }
}
