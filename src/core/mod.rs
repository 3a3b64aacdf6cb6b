//! Core primitives: the rank encoding and the puzzle move vocabulary.
//!
//! Everything in this module is pure and synchronous; the networking and
//! storage layers build on it.

pub mod rank;
pub mod rotation;

// Re-export core types
pub use rank::{RankError, RANK_TIME_CAPACITY_MILLIS};
pub use rotation::{Axis, Rotation};
