//! Binary diff engine for delta-friendly archive patching
//!
//! Implements the bsdiff family algorithm: a suffix array over the old data
//! drives a longest-match search against the new data, and the resulting
//! match anchors are turned into a stream of control triples interleaved
//! with `new - old` difference bytes and literal extra bytes.
//!
//! The payload written by [`generate_patch`] starts with the 16-byte
//! `ENDSLEY/BSDIFF43` magic and the formatted new-file length, followed by
//! the control/diff/extra stream. [`apply_patch`] is the exact inverse and
//! is used to verify generated patches.

pub mod cancel;
pub mod error;
pub mod matcher;
pub mod patcher;
pub mod storage;
pub mod suffix;
pub mod utils;
pub mod writer;

pub use cancel::{Cancelled, CancellationToken};
pub use error::{BsDiffError, Result};
pub use matcher::{BsDiffMatcher, Match, MatchAnchor, search_for_match};
pub use patcher::apply_patch;
pub use storage::ByteSource;
pub use suffix::group_array;
pub use utils::{length_of_match, read_signed_magnitude, write_signed_magnitude};
pub use writer::{PAYLOAD_MAGIC, generate_patch, generate_patch_with_match_length};
