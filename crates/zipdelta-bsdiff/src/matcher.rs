//! Longest-match search and the approximate match stream
//!
//! [`search_for_match`] finds the longest prefix of `new[new_start..]` that
//! occurs anywhere in the old data by halving a rank range over the group
//! array. [`BsDiffMatcher`] turns repeated searches into a forward-only
//! sequence of match anchors over the new data, greedily skipping ahead
//! when a found match is no better than the byte run already explained by
//! the previous anchor's offset.

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::utils::{length_of_match, lexicographical_compare};
use std::cmp::Ordering;

/// Cumulative match-length budget. Once the total length of all matches
/// examined in one [`BsDiffMatcher::next_match`] call crosses this, the
/// current anchor is emitted as-is to bound worst-case quadratic inputs.
const TOTAL_MATCH_LEN_BUDGET: u64 = 1 << 26;

/// A located run of old data matching a prefix of the new data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Offset of the run in the old data
    pub start: usize,
    /// Length of the matching run, possibly zero
    pub length: usize,
}

/// One anchor of the match sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchAnchor {
    /// Offset of the match in the old data
    pub old_position: usize,
    /// Offset of the match in the new data
    pub new_position: usize,
}

/// Locate the longest prefix of `new[new_start..]` occurring in `old`.
///
/// Halves the rank range `[0, old.len()]`, comparing the new suffix with
/// the old suffix at the pivot rank; once the range width drops below two,
/// both boundary candidates are measured directly and the longer match
/// wins.
pub fn search_for_match(group_array: &[i32], old: &[u8], new: &[u8], new_start: usize) -> Match {
    let mut lo = 0usize;
    let mut hi = old.len();

    while hi - lo >= 2 {
        let pivot = lo + (hi - lo) / 2;
        let pivot_pos = group_array[pivot] as usize;
        if lexicographical_compare(&old[pivot_pos..], &new[new_start..]) == Ordering::Less {
            lo = pivot;
        } else {
            hi = pivot;
        }
    }

    let lo_pos = group_array[lo] as usize;
    let lo_len = length_of_match(old, lo_pos, new, new_start);
    let hi_pos = group_array[hi] as usize;
    let hi_len = length_of_match(old, hi_pos, new, new_start);

    if lo_len > hi_len {
        Match {
            start: lo_pos,
            length: lo_len,
        }
    } else {
        Match {
            start: hi_pos,
            length: hi_len,
        }
    }
}

/// Produces the lazy, forward-only sequence of match anchors covering the
/// new data left to right.
pub struct BsDiffMatcher<'a> {
    old: &'a [u8],
    new: &'a [u8],
    /// Sorted-rank to suffix-offset mapping for `old`, from
    /// [`crate::suffix::group_array`]
    group_array: &'a [i32],
    /// Old-data offset of the current match; zero before the first match
    old_pos: usize,
    /// New-data offset of the current match. The next search starts at
    /// `new_pos + match_len`.
    new_pos: usize,
    /// Matching byte count of the current match
    match_len: usize,
    /// Matches shorter than this relative to the drift estimate are
    /// skipped rather than anchored
    minimum_match_length: usize,
    cancel: &'a CancellationToken,
}

impl<'a> BsDiffMatcher<'a> {
    pub fn new(
        old: &'a [u8],
        new: &'a [u8],
        group_array: &'a [i32],
        minimum_match_length: usize,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            old,
            new,
            group_array,
            old_pos: 0,
            new_pos: 0,
            match_len: 0,
            minimum_match_length,
            cancel,
        }
    }

    /// Advance to the next match anchor, or `None` once the new-data
    /// cursor reaches the end.
    pub fn next_match(&mut self) -> Result<Option<MatchAnchor>> {
        // Offset between the old and new indices of the previous match.
        let previous_old_offset = self.old_pos as i64 - self.new_pos as i64;

        // Look for a new match starting from the end of the previous one.
        self.new_pos += self.match_len;

        // Bytes of the forward extension of the previous match that
        // literally agree: old[new_pos + previous_old_offset ..] versus
        // new[new_pos ..], over the range covered so far.
        let mut num_matches: i64 = 0;
        let mut matches_cache_size: i64 = 0;

        let mut total_match_len: u64 = 0;

        while self.new_pos < self.new.len() {
            self.cancel.check()?;

            let found = search_for_match(self.group_array, self.old, self.new, self.new_pos);
            self.old_pos = found.start;
            self.match_len = found.length;
            total_match_len += self.match_len as u64;

            // Grow the num_matches estimate to cover the new match length.
            while matches_cache_size < self.match_len as i64 {
                let old_index = self.new_pos as i64 + previous_old_offset + matches_cache_size;
                let new_index = self.new_pos as i64 + matches_cache_size;
                if old_index < self.old.len() as i64
                    && self.old[old_index as usize] == self.new[new_index as usize]
                {
                    num_matches += 1;
                }
                matches_cache_size += 1;
            }

            // Anchor when the match is clearly better than the drift
            // estimate, or when the budget is exhausted.
            if self.match_len as i64 > num_matches + self.minimum_match_length as i64
                || total_match_len >= TOTAL_MATCH_LEN_BUDGET
            {
                return Ok(Some(MatchAnchor {
                    old_position: self.old_pos,
                    new_position: self.new_pos,
                }));
            }

            if self.match_len == 0 {
                self.new_pos += 1;
            } else if self.match_len as i64 == num_matches {
                // The drift explains the whole match; a better anchor is
                // unlikely anywhere inside it, so skip past.
                self.new_pos += num_matches as usize;
                num_matches = 0;
                matches_cache_size = 0;
            } else {
                // Advance one byte, dropping its contribution from the
                // running estimate.
                let old_index = self.new_pos as i64 + previous_old_offset;
                if old_index < self.old.len() as i64
                    && self.old[old_index as usize] == self.new[self.new_pos]
                {
                    num_matches -= 1;
                }
                self.new_pos += 1;
                matches_cache_size -= 1;
            }
        }

        Ok(None)
    }
}
