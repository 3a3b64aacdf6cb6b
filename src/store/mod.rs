//! Ranked Store Layer
//!
//! Persisted hiscore entries live behind this capability. The store is the
//! only point of concurrency control in the system: sessions share no
//! mutable state, and the conditional insert is required to be atomic with
//! respect to concurrent submissions for the same board.
//!
//! The store is injected into each session as an `Arc<dyn RankedStore>` so
//! tests can substitute doubles and no session couples to a hidden global
//! client.

pub mod memory;

pub use memory::MemoryRankedStore;

use async_trait::async_trait;
use tokio::sync::broadcast;

/// Store errors. All of them are recovered locally by callers; the
/// user-visible effect of a failed call is at most a stale or missing push.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The write transaction was rejected by the backend.
    #[error("transaction failed: {0}")]
    TransactionFailed(String),
}

/// Per-board ranked collection with an atomic conditional-write rule.
#[async_trait]
pub trait RankedStore: Send + Sync {
    /// Submit one entry to the board's ranked collection.
    ///
    /// Required semantics, atomic per board against concurrent calls:
    /// an entry replaces a prior entry for the same `name` only if the new
    /// rank is numerically smaller (best-rank-wins, independent of arrival
    /// order); entries for distinct names coexist; the collection may be
    /// trimmed to a bounded retained size no smaller than the read window.
    async fn conditional_insert(
        &self,
        board: &str,
        name: &str,
        rank: f64,
        rotations: &str,
    ) -> Result<(), StoreError>;

    /// Read the inclusive `[start, stop]` range of `(name, rank)` pairs,
    /// ascending by rank. A board with no entries yields an empty sequence.
    async fn top_range(
        &self,
        board: &str,
        start: usize,
        stop: usize,
    ) -> Result<Vec<(String, f64)>, StoreError>;

    /// Notification stream for renewed store availability after an outage.
    /// Dropping the receiver releases the subscription.
    fn subscribe_reconnect(&self) -> broadcast::Receiver<()>;
}
