//! Minimal ZIP entry model for archive patch generation
//!
//! This crate carries the entry-level metadata that the patch planner needs
//! to reason about a ZIP archive: compression method, checksums, sizes, and
//! the file offsets of the compressed payloads. Central-directory parsing
//! and deflate parameter divination stay behind the [`EntryLister`] and
//! [`DeflateDiviner`] traits so the planner can be driven by any reader.

pub mod deflate;
pub mod entry;
pub mod error;

pub use deflate::{DeflateDiviner, DeflateParameters, DivinedEntry};
pub use entry::{COMPRESSION_METHOD_DEFLATE, COMPRESSION_METHOD_STORED, EntryPath, ZipEntry};
pub use error::{Result, ZipError};

use std::path::Path;

/// Lists the entries of a ZIP archive in file order.
///
/// Implementations own central-directory parsing and must resolve the file
/// offset of each entry's compressed payload before returning it.
pub trait EntryLister {
    fn list_entries(&self, archive: &Path) -> Result<Vec<ZipEntry>>;
}
