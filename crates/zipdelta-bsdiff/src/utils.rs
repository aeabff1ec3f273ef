//! Shared primitives for the diff engine
//!
//! The control stream stores signed 64-bit values in a sign-magnitude
//! encoding: 8 bytes little-endian, with the sign carried in bit 63 of the
//! magnitude rather than two's complement. This must stay bit-exact for
//! interoperability with existing patch consumers.

use crate::error::Result;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::cmp::Ordering;
use std::io::{Read, Write};

/// Sign bit of the formatted 64-bit encoding
const NEGATIVE_MASK: u64 = 1 << 63;

/// Write a signed 64-bit value in sign-magnitude form, least significant
/// byte first.
pub fn write_signed_magnitude<W: Write>(value: i64, out: &mut W) -> Result<()> {
    let mut raw = value as u64;
    if value < 0 {
        raw = (value.wrapping_neg() as u64) | NEGATIVE_MASK;
    }
    out.write_u64::<LittleEndian>(raw)?;
    Ok(())
}

/// Read a value written by [`write_signed_magnitude`].
pub fn read_signed_magnitude<R: Read>(reader: &mut R) -> Result<i64> {
    let raw = reader.read_u64::<LittleEndian>()?;
    // A bare sign bit has no magnitude to negate; it decodes as i64::MIN,
    // mirroring how it was encoded.
    if raw & NEGATIVE_MASK != 0 && raw != NEGATIVE_MASK {
        Ok(-((raw & !NEGATIVE_MASK) as i64))
    } else {
        Ok(raw as i64)
    }
}

/// Length of the identical byte run at the given offsets of both inputs.
///
/// Scans forward until one input ends or a byte differs; zero if the first
/// bytes already differ.
pub fn length_of_match(old: &[u8], old_start: usize, new: &[u8], new_start: usize) -> usize {
    old[old_start.min(old.len())..]
        .iter()
        .zip(&new[new_start.min(new.len())..])
        .take_while(|(a, b)| a == b)
        .count()
}

/// Byte-wise lexicographic comparison of two suffixes.
///
/// When one input is a prefix of the other, the shorter one compares less.
pub fn lexicographical_compare(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn round_trip(value: i64) -> i64 {
        let mut buf = Vec::new();
        write_signed_magnitude(value, &mut buf).unwrap();
        assert_eq!(buf.len(), 8);
        read_signed_magnitude(&mut Cursor::new(buf)).unwrap()
    }

    #[test]
    fn test_signed_magnitude_round_trip_edges() {
        for value in [0, 1, -1, 255, -255, i64::MAX, i64::MIN, i64::MIN + 1] {
            assert_eq!(round_trip(value), value);
        }
    }

    #[test]
    fn test_signed_magnitude_byte_layout() {
        let mut buf = Vec::new();
        write_signed_magnitude(-5, &mut buf).unwrap();
        assert_eq!(buf, vec![5, 0, 0, 0, 0, 0, 0, 0x80]);

        buf.clear();
        write_signed_magnitude(0x0102, &mut buf).unwrap();
        assert_eq!(buf, vec![2, 1, 0, 0, 0, 0, 0, 0]);
    }

    proptest! {
        #[test]
        fn prop_signed_magnitude_round_trip(value in any::<i64>()) {
            prop_assert_eq!(round_trip(value), value);
        }
    }

    #[test]
    fn test_length_of_match() {
        let a = vec![7u8; 100];
        let b = vec![7u8; 100];
        assert_eq!(length_of_match(&a, 0, &b, 0), 100);

        let mut c = b.clone();
        c[5] = 8;
        assert_eq!(length_of_match(&a, 0, &c, 0), 5);

        assert_eq!(length_of_match(&[], 0, &[], 0), 0);
        assert_eq!(length_of_match(&a, 100, &b, 0), 0);
        assert_eq!(length_of_match(&a, 98, &b, 0), 2);
    }

    #[test]
    fn test_lexicographical_compare() {
        assert_eq!(lexicographical_compare(b"abc", b"abd"), Ordering::Less);
        assert_eq!(lexicographical_compare(b"abd", b"abc"), Ordering::Greater);
        assert_eq!(lexicographical_compare(b"abc", b"abc"), Ordering::Equal);
        // Shorter is less on common-prefix exhaustion
        assert_eq!(lexicographical_compare(b"ab", b"abc"), Ordering::Less);
        assert_eq!(lexicographical_compare(b"abc", b"ab"), Ordering::Greater);
        assert_eq!(lexicographical_compare(b"", b"a"), Ordering::Less);
    }
}
