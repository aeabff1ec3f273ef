//! Random-access byte storage for diff inputs
//!
//! The engine only needs `&[u8]` access to its inputs; this type decides
//! how those bytes are held. File inputs are memory-mapped when possible
//! (bounded by the engine's 2 GiB addressable ceiling) and fall back to a
//! heap read otherwise; in-memory inputs are wrapped directly.

use crate::error::{BsDiffError, Result};
use crate::suffix::MAX_INPUT_LEN;
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::ops::Deref;
use std::path::Path;
use tracing::debug;

enum Backing {
    Heap(Vec<u8>),
    Mapped(Mmap),
}

/// Byte storage backed by either a heap buffer or a read-only memory map
pub struct ByteSource {
    backing: Backing,
}

impl ByteSource {
    /// Wrap an in-memory buffer
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self {
            backing: Backing::Heap(data),
        }
    }

    /// Open a file, memory-mapping it when possible
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        if size > MAX_INPUT_LEN {
            return Err(BsDiffError::InputTooLarge {
                size,
                max: MAX_INPUT_LEN,
            });
        }

        if size > 0 {
            match unsafe { MmapOptions::new().map(&file) } {
                Ok(mmap) => {
                    debug!("memory-mapped {:?} ({} bytes)", path, size);
                    return Ok(Self {
                        backing: Backing::Mapped(mmap),
                    });
                }
                Err(e) => {
                    debug!("mmap of {:?} failed, reading to heap: {}", path, e);
                }
            }
        }

        let data = std::fs::read(path)?;
        Ok(Self::from_vec(data))
    }
}

impl Deref for ByteSource {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match &self.backing {
            Backing::Heap(data) => data,
            Backing::Mapped(mmap) => mmap,
        }
    }
}

impl AsRef<[u8]> for ByteSource {
    fn as_ref(&self) -> &[u8] {
        self
    }
}
