//! ZIP entry metadata and path keys

use std::fmt;

/// Compression method value for stored (uncompressed) entries
pub const COMPRESSION_METHOD_STORED: u16 = 0;

/// Compression method value for deflate-compressed entries
pub const COMPRESSION_METHOD_DEFLATE: u16 = 8;

/// The raw filename bytes of a ZIP entry, usable as a map key.
///
/// ZIP filenames are byte sequences, not strings; two paths are the same
/// entry iff their bytes are equal element-wise. Decoding to text is only
/// done for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryPath(Vec<u8>);

impl EntryPath {
    /// Create a path key from raw filename bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The raw filename bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for EntryPath {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<&[u8]> for EntryPath {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Metadata for a single ZIP entry
///
/// Everything the patch planner needs to know about one entry: how it is
/// compressed, its checksum and sizes, and where its bytes live in the
/// archive. The listing collaborator resolves the compressed-data offset
/// while walking the local headers, so a constructed entry is complete and
/// immutable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ZipEntry {
    /// Compression method (0 = stored, 8 = deflate)
    pub compression_method: u16,
    /// CRC-32 of the uncompressed data
    pub crc32: u32,
    /// Size of the compressed payload in bytes
    pub compressed_size: u64,
    /// Size of the uncompressed data in bytes
    pub uncompressed_size: u64,
    /// Raw filename bytes
    pub path: EntryPath,
    /// General purpose flag bit 11: filename bytes are UTF-8
    pub path_is_utf8: bool,
    /// File offset of the local header
    pub local_header_offset: u64,
    /// File offset of the compressed payload
    pub compressed_data_offset: u64,
}

impl ZipEntry {
    /// Whether this entry is stored without compression
    pub fn is_stored(&self) -> bool {
        self.compression_method == COMPRESSION_METHOD_STORED
    }

    /// Whether this entry carries a real deflate stream.
    ///
    /// An entry that declares method 8 but whose compressed size equals its
    /// uncompressed size is not deflate-shaped and is treated as opaque.
    pub fn is_deflate_compressed(&self) -> bool {
        self.compression_method == COMPRESSION_METHOD_DEFLATE
            && self.compressed_size != self.uncompressed_size
    }

    /// Decode the filename for display.
    ///
    /// UTF-8 when flag bit 11 is set; otherwise the bytes come from a
    /// legacy single-byte encoding and are decoded lossily.
    pub fn path_string(&self) -> String {
        if self.path_is_utf8 {
            String::from_utf8_lossy(self.path.as_bytes()).into_owned()
        } else {
            self.path.as_bytes().iter().map(|&b| b as char).collect()
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(method: u16, compressed: u64, uncompressed: u64) -> ZipEntry {
        ZipEntry {
            compression_method: method,
            crc32: 0xDEADBEEF,
            compressed_size: compressed,
            uncompressed_size: uncompressed,
            path: EntryPath::from("a/b.txt"),
            path_is_utf8: true,
            local_header_offset: 0,
            compressed_data_offset: 37,
        }
    }

    #[test]
    fn test_entry_path_equality_is_structural() {
        let a = EntryPath::new(b"dir/file.bin".to_vec());
        let b = EntryPath::from("dir/file.bin");
        let c = EntryPath::from("dir/other.bin");

        assert_eq!(a, b);
        assert_ne!(a, c);

        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(a, 1);
        assert_eq!(map.get(&b), Some(&1));
    }

    #[test]
    fn test_deflate_shaped_detection() {
        assert!(entry(COMPRESSION_METHOD_DEFLATE, 10, 20).is_deflate_compressed());
        // Declared deflate but sizes match: not actually compressed
        assert!(!entry(COMPRESSION_METHOD_DEFLATE, 20, 20).is_deflate_compressed());
        assert!(!entry(COMPRESSION_METHOD_STORED, 20, 20).is_deflate_compressed());
        assert!(entry(COMPRESSION_METHOD_STORED, 20, 20).is_stored());
    }

    #[test]
    fn test_path_string_decoding() {
        let mut e = entry(COMPRESSION_METHOD_STORED, 5, 5);
        e.path = EntryPath::new(vec![0x68, 0x69, 0xA9]);
        e.path_is_utf8 = false;
        assert_eq!(e.path_string(), "hi\u{a9}");

        e.path = EntryPath::from("hellö.txt");
        e.path_is_utf8 = true;
        assert_eq!(e.path_string(), "hellö.txt");
    }

    #[test]
    fn test_entry_identity_includes_data_offset() {
        let a = entry(COMPRESSION_METHOD_STORED, 5, 5);
        let mut b = a.clone();
        assert_eq!(a, b);

        b.compressed_data_offset = 99;
        assert_ne!(a, b);
    }
}
