//! Archive patch generation
//!
//! Computes a compact binary patch between two versions of a ZIP-structured
//! archive. Independently compressed entries hide structural similarity
//! from a byte-level diff, so the pipeline first decides which entries to
//! inflate (the pre-diff plan), rewrites both archives into delta-friendly
//! form, diffs those with the bsdiff engine, and serializes the plan plus
//! payload into one self-describing patch container.
//!
//! The stages are usable on their own:
//!
//! - [`PreDiffPlanner`] classifies matched entry pairs and freezes the
//!   uncompression plans.
//! - [`write_delta_friendly_file`] materializes a delta-friendly file and
//!   returns the inverse recompression plan.
//! - [`PreDiffExecutor`] runs both against a pair of archives.
//! - [`PatchWriter`] emits the container format.
//! - [`ArchivePatchGenerator`] is the whole pipeline behind one call.

pub mod delta_friendly;
pub mod error;
pub mod executor;
pub mod generator;
pub mod patch_writer;
pub mod plan;
pub mod planner;
pub mod range;
pub mod recommendation;
pub mod similarity;

pub use delta_friendly::write_delta_friendly_file;
pub use error::{PatchError, Result};
pub use executor::PreDiffExecutor;
pub use generator::{ArchivePatchGenerator, BsDiffDeltaGenerator, DeltaGenerator};
pub use patch_writer::{
    COMPATIBILITY_WINDOW_DEFAULT_DEFLATE, DELTA_FORMAT_BSDIFF, PATCH_IDENTIFIER, PatchWriter,
};
pub use plan::PreDiffPlan;
pub use planner::PreDiffPlanner;
pub use range::TypedRange;
pub use recommendation::{
    QualifiedRecommendation, Recommendation, RecommendationModifier, RecommendationReason,
};
pub use similarity::{Crc32SimilarityFinder, SimilarityFinder};

pub use zipdelta_bsdiff::{CancellationToken, Cancelled};
