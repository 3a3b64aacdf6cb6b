//! Composite Rank Encoding
//!
//! A hiscore entry is ordered by a single f64 rank that combines the move
//! count and the submission time:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  rank = n_rotations + (1 - t / 2^46)                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  integer part    = move count (fewer rotations sorts first) │
//! │  fractional part = recency tie-break                        │
//! │                                                             │
//! │  t grows  →  fraction shrinks  →  later submissions sort    │
//! │  ahead of earlier ones within the same move count.          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The whole encoding stays exact in an f64: timestamps below 2^46 and
//! integer parts up to 99 together need at most 53 significand bits, so
//! no two distinct (moves, millisecond) pairs collide.

/// Millisecond capacity of the fractional part (2^46).
///
/// Largest power of two such that a millisecond timestamp still embeds in
/// the fraction of an f64 without rounding loss for integer parts up to 99.
/// Reached around year 4199, at which point submissions stop encoding.
pub const RANK_TIME_CAPACITY_MILLIS: u64 = 1 << 46;

/// Rank encoding errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RankError {
    /// Timestamp no longer fits in the fractional part.
    #[error("timestamp {0} ms exceeds rank encoding capacity")]
    EncodingOverflow(u64),
}

/// Encode a solve into its composite rank.
///
/// `timestamp_millis` is wall-clock Unix milliseconds and must be >= 1;
/// any real clock satisfies this. Returns [`RankError::EncodingOverflow`]
/// once the clock reaches [`RANK_TIME_CAPACITY_MILLIS`]; callers drop the
/// submission and log rather than crash.
pub fn encode(n_rotations: u32, timestamp_millis: u64) -> Result<f64, RankError> {
    if timestamp_millis >= RANK_TIME_CAPACITY_MILLIS {
        return Err(RankError::EncodingOverflow(timestamp_millis));
    }
    let fraction = 1.0 - timestamp_millis as f64 / RANK_TIME_CAPACITY_MILLIS as f64;
    Ok(n_rotations as f64 + fraction)
}

/// Recover the move count from a rank.
///
/// Exact inverse of [`encode`] for the integer component. The fractional
/// component is a tie-break only and is never decoded back to a timestamp.
pub fn decode(rank: f64) -> u32 {
    rank.floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // A plausible "now" for tests: 2023-09-01 in Unix millis.
    const T: u64 = 1_693_526_400_000;

    #[test]
    fn test_integer_part_is_move_count() {
        for n in [0u32, 1, 7, 42, 99] {
            let rank = encode(n, T).unwrap();
            assert_eq!(decode(rank), n);
        }
    }

    #[test]
    fn test_later_submission_ranks_better_on_tie() {
        let earlier = encode(10, T).unwrap();
        let later = encode(10, T + 1).unwrap();
        assert!(later < earlier);
        assert_eq!(decode(earlier), decode(later));
    }

    #[test]
    fn test_move_count_dominates_recency() {
        // An old 9-move solve still beats a fresh 10-move solve.
        let old_nine = encode(9, 1).unwrap();
        let fresh_ten = encode(10, RANK_TIME_CAPACITY_MILLIS - 1).unwrap();
        assert!(old_nine < fresh_ten);
    }

    #[test]
    fn test_overflow_boundary() {
        assert!(encode(5, RANK_TIME_CAPACITY_MILLIS - 1).is_ok());
        assert_eq!(
            encode(5, RANK_TIME_CAPACITY_MILLIS),
            Err(RankError::EncodingOverflow(RANK_TIME_CAPACITY_MILLIS))
        );
        assert!(encode(5, u64::MAX).is_err());
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(n in 0u32..=99, t in 1u64..RANK_TIME_CAPACITY_MILLIS) {
            let rank = encode(n, t).unwrap();
            prop_assert_eq!(decode(rank), n);
        }

        #[test]
        fn prop_tie_break_prefers_recent(
            n in 0u32..=99,
            t1 in 1u64..RANK_TIME_CAPACITY_MILLIS - 1,
            delta in 1u64..1_000_000,
        ) {
            let t2 = (t1 + delta).min(RANK_TIME_CAPACITY_MILLIS - 1);
            prop_assume!(t1 < t2);
            let r1 = encode(n, t1).unwrap();
            let r2 = encode(n, t2).unwrap();
            prop_assert!(r2 < r1);
        }
    }
}
