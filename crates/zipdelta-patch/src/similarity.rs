//! Rename detection between archive versions

use std::collections::HashMap;
use std::path::Path;
use zipdelta_zip::ZipEntry;

/// Finds entries in a base archive that are similar to an entry of another
/// archive.
///
/// When the result has more than one entry, they are ordered from most to
/// least similar.
pub trait SimilarityFinder {
    fn find_similar_entries(&self, new_archive: &Path, new_entry: &ZipEntry) -> Vec<ZipEntry>;
}

/// Similarity by identical content checksum.
///
/// Entries whose uncompressed CRC-32 matches are considered identical
/// content under a different path, which is what rename detection needs.
pub struct Crc32SimilarityFinder {
    entries_by_crc32: HashMap<u32, Vec<ZipEntry>>,
}

impl Crc32SimilarityFinder {
    /// Index the base archive's entries by checksum
    pub fn new(base_entries: impl IntoIterator<Item = ZipEntry>) -> Self {
        let mut entries_by_crc32: HashMap<u32, Vec<ZipEntry>> = HashMap::new();
        for entry in base_entries {
            entries_by_crc32.entry(entry.crc32).or_default().push(entry);
        }
        Self { entries_by_crc32 }
    }
}

impl SimilarityFinder for Crc32SimilarityFinder {
    fn find_similar_entries(&self, _new_archive: &Path, new_entry: &ZipEntry) -> Vec<ZipEntry> {
        self.entries_by_crc32
            .get(&new_entry.crc32)
            .cloned()
            .unwrap_or_default()
    }
}
