//! Deflate parameter space and divination interface
//!
//! Zlib-style deflaters are configured by a compression level (1-9), a
//! strategy (0 = default, 1 = filtered, 2 = huffman-only), and whether the
//! stream is wrapped in a zlib envelope. That gives 54 distinct parameter
//! combinations, each mapped to a canonical integer id so parameters can be
//! carried in a patch and compared for exact round-trip recompression.

use crate::entry::ZipEntry;
use crate::error::{Result, ZipError};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// One of the 54 valid deflate parameter combinations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeflateParameters {
    /// Compression level, 1 through 9
    pub level: u8,
    /// Compression strategy, 0 through 2
    pub strategy: u8,
    /// True when the stream is raw deflate with no zlib wrapper
    pub nowrap: bool,
}

impl DeflateParameters {
    /// Create parameters, validating the level and strategy ranges
    pub fn of(level: u8, strategy: u8, nowrap: bool) -> Result<Self> {
        if !(1..=9).contains(&level) || strategy > 2 {
            return Err(ZipError::InvalidDeflateParameters { level, strategy });
        }
        Ok(Self {
            level,
            strategy,
            nowrap,
        })
    }

    /// The canonical id for this combination, in 1..=54.
    ///
    /// Ids 1-27 cover the nowrap space (level-major within each strategy),
    /// ids 28-54 the wrapped space.
    pub fn id(&self) -> u8 {
        let base = self.strategy * 9 + self.level;
        if self.nowrap { base } else { base + 27 }
    }

    /// The exact inverse of [`DeflateParameters::id`]
    pub fn from_id(id: u8) -> Result<Self> {
        if !(1..=54).contains(&id) {
            return Err(ZipError::InvalidDeflateParameterId(id));
        }
        let nowrap = id <= 27;
        let base = if nowrap { id } else { id - 27 };
        let strategy = (base - 1) / 9;
        let level = base - strategy * 9;
        Ok(Self {
            level,
            strategy,
            nowrap,
        })
    }

    /// The flate2 compression setting for this level
    pub fn compression(&self) -> flate2::Compression {
        flate2::Compression::new(u32::from(self.level))
    }
}

impl fmt::Display for DeflateParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "level={},strategy={},nowrap={}",
            self.level, self.strategy, self.nowrap
        )
    }
}

impl FromStr for DeflateParameters {
    type Err = ZipError;

    fn from_str(input: &str) -> Result<Self> {
        let mut level = None;
        let mut strategy = None;
        let mut nowrap = None;
        for part in input.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| ZipError::MalformedParameterString(input.to_string()))?;
            match key {
                "level" => level = value.parse::<u8>().ok(),
                "strategy" => strategy = value.parse::<u8>().ok(),
                "nowrap" => nowrap = value.parse::<bool>().ok(),
                _ => return Err(ZipError::MalformedParameterString(input.to_string())),
            }
        }
        match (level, strategy, nowrap) {
            (Some(level), Some(strategy), Some(nowrap)) => Self::of(level, strategy, nowrap),
            _ => Err(ZipError::MalformedParameterString(input.to_string())),
        }
    }
}

/// A listed entry together with its divined deflate parameters, if any
#[derive(Debug, Clone)]
pub struct DivinedEntry {
    /// The entry the divination ran against
    pub entry: ZipEntry,
    /// Parameters that reproduce the entry's compressed bytes, or `None`
    /// when no candidate matched
    pub parameters: Option<DeflateParameters>,
}

/// Divines the deflate parameters used to produce each compressed entry.
///
/// Implementations typically recompress a prefix of each entry under
/// candidate parameter sets and compare against the stored bytes. A `None`
/// result is not an error; the planner degrades to diffing that entry in
/// its compressed form.
pub trait DeflateDiviner {
    fn divine_parameters(&self, archive: &Path) -> Result<Vec<DivinedEntry>>;
}
