//! Property-based invariant tests for CPR reply parsing.
//!
//! 1. A well-formed reply is found regardless of surrounding noise.
//! 2. Parsed coordinates are always at least 1.
//! 3. Arbitrary input never panics the parser.
//! 4. Splitting a reply across reads does not change the result.
//! 5. The scanner never holds more than `capacity - 1` bytes.

use einfo_core::cpr::{CursorPosition, ReplyScanner, parse_cpr_reply};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn reply(row: u16, col: u16) -> Vec<u8> {
    format!("\x1b[{row};{col}R").into_bytes()
}

/// Bytes that can never start an escape sequence.
fn noise_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>().prop_filter("no ESC", |b| *b != 0x1b), 0..40)
}

fn position_strategy() -> impl Strategy<Value = (u16, u16)> {
    (1u16..=u16::MAX, 1u16..=u16::MAX)
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Reply surrounded by noise
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reply_found_in_noise(
        (row, col) in position_strategy(),
        before in noise_strategy(),
        after in noise_strategy(),
    ) {
        let mut bytes = before;
        bytes.extend(reply(row, col));
        bytes.extend(after);
        prop_assert_eq!(parse_cpr_reply(&bytes), CursorPosition::new(row, col));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Coordinates are positive
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn parsed_coordinates_positive(row in 0u32..100_000, col in 0u32..100_000) {
        let bytes = format!("\x1b[{row};{col}R").into_bytes();
        match parse_cpr_reply(&bytes) {
            Some(pos) => {
                prop_assert!(pos.row >= 1 && pos.col >= 1);
                prop_assert_eq!(u32::from(pos.row), row);
                prop_assert_eq!(u32::from(pos.col), col);
            }
            None => prop_assert!(
                row == 0 || col == 0 || row > u32::from(u16::MAX) || col > u32::from(u16::MAX),
                "valid reply rejected: {row};{col}"
            ),
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. No panics
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        if let Some(pos) = parse_cpr_reply(&bytes) {
            prop_assert!(pos.row >= 1 && pos.col >= 1);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Chunked delivery
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn split_reply_reassembles(
        (row, col) in position_strategy(),
        before in noise_strategy(),
        split in any::<prop::sample::Index>(),
    ) {
        let mut bytes = before;
        bytes.extend(reply(row, col));
        let cut = split.index(bytes.len() + 1);

        let mut scanner = ReplyScanner::new(100);
        let mut found = None;
        for chunk in [&bytes[..cut], &bytes[cut..]] {
            let spare = scanner.spare_mut();
            let n = chunk.len().min(spare.len());
            spare[..n].copy_from_slice(&chunk[..n]);
            if let Some(pos) = scanner.commit(n) {
                found = Some(pos);
                break;
            }
        }
        prop_assert_eq!(found, CursorPosition::new(row, col));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Scanner capacity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn scanner_respects_capacity(
        capacity in 1usize..64,
        chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..32), 0..8),
    ) {
        let mut scanner = ReplyScanner::new(capacity);
        for chunk in chunks {
            if scanner.is_full() {
                break;
            }
            let spare = scanner.spare_mut();
            let n = chunk.len().min(spare.len());
            spare[..n].copy_from_slice(&chunk[..n]);
            let _ = scanner.commit(n);
            prop_assert!(scanner.filled().len() < capacity.max(2));
        }
    }
}
