//! Round-trip tests: generated payloads applied to the old data must
//! reconstruct the new data exactly.

use zipdelta_bsdiff::{
    CancellationToken, apply_patch, generate_patch, generate_patch_with_match_length,
};

fn round_trip(old: &[u8], new: &[u8]) {
    let cancel = CancellationToken::new();
    let mut payload = Vec::new();
    generate_patch(old, new, &mut payload, &cancel).expect("generation should succeed");
    let result = apply_patch(old, &payload).expect("application should succeed");
    assert_eq!(
        result,
        new,
        "round trip failed for old={} bytes, new={} bytes",
        old.len(),
        new.len()
    );
}

#[test]
fn test_round_trip_small_edit() {
    round_trip(b"Hello, World!", b"Hello, Rust!");
}

#[test]
fn test_round_trip_identical() {
    let data = b"identical data that should diff to nearly nothing";
    round_trip(data, data);
}

#[test]
fn test_round_trip_empty_old() {
    round_trip(b"", b"brand new content");
}

#[test]
fn test_round_trip_empty_new() {
    round_trip(b"content to delete", b"");
}

#[test]
fn test_round_trip_both_empty() {
    round_trip(b"", b"");
}

#[test]
fn test_round_trip_single_byte() {
    round_trip(b"A", b"B");
}

#[test]
fn test_round_trip_insertion() {
    round_trip(
        b"The quick fox jumps over the lazy dog",
        b"The quick brown fox jumps over the lazy dog",
    );
}

#[test]
fn test_round_trip_deletion() {
    round_trip(
        b"The quick brown fox jumps over the lazy dog",
        b"The quick fox jumps over the lazy dog",
    );
}

#[test]
fn test_round_trip_reordered_blocks() {
    round_trip(b"AAAABBBBCCCCDDDD", b"CCCCAAAADDDDBBBB");
}

#[test]
fn test_round_trip_disjoint_content() {
    round_trip(&[0x11u8; 300], &[0xEEu8; 450]);
}

#[test]
fn test_round_trip_scattered_edits() {
    // Deterministic pseudo-random base so failures reproduce.
    let mut state = 0x2545F4914F6CDD1Du64;
    let mut next = || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state >> 24) as u8
    };

    let old: Vec<u8> = (0..8192).map(|_| next()).collect();
    let mut new = old.clone();
    for i in 0..64 {
        let pos = (i * 127) % new.len();
        new[pos] = new[pos].wrapping_add(1);
    }
    new.extend_from_slice(b"appended tail content");

    round_trip(&old, &new);
}

#[test]
fn test_round_trip_shifted_window() {
    let old: Vec<u8> = (0u8..=255).cycle().take(4096).collect();
    let new: Vec<u8> = old[1234..3900].to_vec();
    round_trip(&old, &new);
}

#[test]
fn test_round_trip_custom_match_length() {
    let old = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let new = b"abcdefghijklmnopqrstuvwxyz___0123456789";

    let cancel = CancellationToken::new();
    let mut payload = Vec::new();
    generate_patch_with_match_length(old, new, &mut payload, &cancel, 4)
        .expect("generation should succeed");
    let result = apply_patch(old, &payload).expect("application should succeed");
    assert_eq!(result, new);
}

#[test]
fn test_patch_smaller_than_new_for_shared_content() {
    let old = vec![42u8; 20000];
    let mut new = old.clone();
    new[10000] = 99;

    let cancel = CancellationToken::new();
    let mut payload = Vec::new();
    generate_patch(&old, &new, &mut payload, &cancel).expect("generation should succeed");

    // Uncompressed payload still carries the diff bytes, but the control
    // stream must not blow up: one entry covering the whole match span.
    assert!(
        payload.len() <= new.len() + 24 + 3 * 8,
        "payload unexpectedly large: {} bytes",
        payload.len()
    );

    let result = apply_patch(&old, &payload).expect("application should succeed");
    assert_eq!(result, new);
}
