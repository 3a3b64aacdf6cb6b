//! Board Capability
//!
//! A board, as the hiscore core sees it, is an identity plus an
//! authoritative solve check. Whatever owns the actual puzzle logic (the
//! panel layer in production, [`LoopGridBoard`] in the demo binary and in
//! tests) implements this trait; the synchronizer never looks inside.

pub mod loopgrid;

pub use loopgrid::LoopGridBoard;

use crate::core::rotation::Rotation;

/// The capability a leaderboard session needs from a puzzle board.
///
/// Immutable for the lifetime of a synchronization session.
pub trait Board: Send + Sync {
    /// Unique identifier; one leaderboard exists per name.
    fn name(&self) -> &str;

    /// Authoritative move-replay check: does this sequence solve the board?
    fn is_solved_by(&self, rotations: &[Rotation]) -> bool;
}
