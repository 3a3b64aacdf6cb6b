//! In-Process Ranked Store
//!
//! Keeps every board's ranked collection in one mutex-guarded map. Each
//! trait call runs as a single critical section, which is exactly the
//! atomicity the conditional-insert rule requires: two concurrent
//! submissions for one board serialize at the lock, and a same-name pair
//! resolves to the better rank whichever lands first.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};

use crate::store::{RankedStore, StoreError};

/// Entries retained per board after trimming. Larger than the read window
/// so aging out the tail never affects a top-window read.
pub const RETAINED_PER_BOARD: usize = 50;

#[derive(Debug, Clone)]
struct StoredEntry {
    name: String,
    rank: f64,
    rotations: String,
}

/// Mutex-guarded ranked store, suitable for single-process deployments and
/// as the test double for the storage capability.
pub struct MemoryRankedStore {
    boards: Mutex<BTreeMap<String, Vec<StoredEntry>>>,
    reconnect_tx: broadcast::Sender<()>,
}

impl MemoryRankedStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (reconnect_tx, _) = broadcast::channel(16);
        Self {
            boards: Mutex::new(BTreeMap::new()),
            reconnect_tx,
        }
    }

    /// Signal renewed availability to every reconnect subscriber.
    ///
    /// Driven by whatever supervises the backing connection; in tests it
    /// simulates recovery from an outage.
    pub fn notify_reconnected(&self) {
        let _ = self.reconnect_tx.send(());
    }

    /// Number of entries currently retained for `board`.
    pub async fn entry_count(&self, board: &str) -> usize {
        let boards = self.boards.lock().await;
        boards.get(board).map(Vec::len).unwrap_or(0)
    }

    /// Stored rotation sequence for `name` on `board`, if present.
    pub async fn rotations_for(&self, board: &str, name: &str) -> Option<String> {
        let boards = self.boards.lock().await;
        boards
            .get(board)?
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.rotations.clone())
    }
}

impl Default for MemoryRankedStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RankedStore for MemoryRankedStore {
    async fn conditional_insert(
        &self,
        board: &str,
        name: &str,
        rank: f64,
        rotations: &str,
    ) -> Result<(), StoreError> {
        let mut boards = self.boards.lock().await;
        let entries = boards.entry(board.to_string()).or_default();

        match entries.iter_mut().find(|entry| entry.name == name) {
            Some(existing) => {
                if rank < existing.rank {
                    existing.rank = rank;
                    existing.rotations = rotations.to_string();
                }
            }
            None => entries.push(StoredEntry {
                name: name.to_string(),
                rank,
                rotations: rotations.to_string(),
            }),
        }

        // Ranks are never NaN; equal ranks require equal submission
        // milliseconds and settle on name order.
        entries.sort_by(|a, b| {
            a.rank
                .partial_cmp(&b.rank)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });
        entries.truncate(RETAINED_PER_BOARD);

        Ok(())
    }

    async fn top_range(
        &self,
        board: &str,
        start: usize,
        stop: usize,
    ) -> Result<Vec<(String, f64)>, StoreError> {
        let boards = self.boards.lock().await;
        let entries = match boards.get(board) {
            Some(entries) => entries,
            None => return Ok(Vec::new()),
        };
        if start >= entries.len() {
            return Ok(Vec::new());
        }
        let stop = stop.min(entries.len() - 1);
        Ok(entries[start..=stop]
            .iter()
            .map(|entry| (entry.name.clone(), entry.rank))
            .collect())
    }

    fn subscribe_reconnect(&self) -> broadcast::Receiver<()> {
        self.reconnect_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rank;
    use std::sync::Arc;

    const T: u64 = 1_693_526_400_000;

    #[tokio::test]
    async fn test_best_rank_wins_regardless_of_order() {
        let ten = rank::encode(10, T).unwrap();
        let eight = rank::encode(8, T + 5).unwrap();

        // Worse first.
        let store = MemoryRankedStore::new();
        store.conditional_insert("3x3", "x", ten, "[]").await.unwrap();
        store.conditional_insert("3x3", "x", eight, "[]").await.unwrap();
        assert_eq!(store.top_range("3x3", 0, 6).await.unwrap(), vec![("x".to_string(), eight)]);

        // Better first.
        let store = MemoryRankedStore::new();
        store.conditional_insert("3x3", "x", eight, "[]").await.unwrap();
        store.conditional_insert("3x3", "x", ten, "[]").await.unwrap();
        assert_eq!(store.top_range("3x3", 0, 6).await.unwrap(), vec![("x".to_string(), eight)]);
    }

    #[tokio::test]
    async fn test_superseding_entry_replaces_rotations() {
        let store = MemoryRankedStore::new();
        let ten = rank::encode(10, T).unwrap();
        let eight = rank::encode(8, T + 5).unwrap();

        store.conditional_insert("3x3", "x", ten, "[10 moves]").await.unwrap();
        store.conditional_insert("3x3", "x", eight, "[8 moves]").await.unwrap();

        assert_eq!(store.entry_count("3x3").await, 1);
        assert_eq!(store.rotations_for("3x3", "x").await.as_deref(), Some("[8 moves]"));
    }

    #[tokio::test]
    async fn test_distinct_names_coexist() {
        let store = MemoryRankedStore::new();
        store.conditional_insert("3x3", "a", rank::encode(5, T).unwrap(), "[]").await.unwrap();
        store.conditional_insert("3x3", "b", rank::encode(9, T).unwrap(), "[]").await.unwrap();

        let top = store.top_range("3x3", 0, 6).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].0, "a");
        assert_eq!(top[1].0, "b");
    }

    #[tokio::test]
    async fn test_boards_are_independent() {
        let store = MemoryRankedStore::new();
        store.conditional_insert("3x3", "a", rank::encode(5, T).unwrap(), "[]").await.unwrap();
        assert!(store.top_range("4x4", 0, 6).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_top_range_ascending_with_recency_tie_break() {
        let store = MemoryRankedStore::new();
        // Same move count; "late" submitted one millisecond after "early".
        store.conditional_insert("3x3", "early", rank::encode(7, T).unwrap(), "[]").await.unwrap();
        store.conditional_insert("3x3", "late", rank::encode(7, T + 1).unwrap(), "[]").await.unwrap();
        store.conditional_insert("3x3", "best", rank::encode(4, T).unwrap(), "[]").await.unwrap();

        let names: Vec<String> = store
            .top_range("3x3", 0, 6)
            .await
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["best", "late", "early"]);
    }

    #[tokio::test]
    async fn test_trim_bound() {
        use rand::Rng;

        let store = MemoryRankedStore::new();
        let mut rng = rand::thread_rng();
        for i in 0..(RETAINED_PER_BOARD + 25) {
            let moves = rng.gen_range(5u32..90);
            let rank = rank::encode(moves, T + i as u64).unwrap();
            store
                .conditional_insert("3x3", &format!("p{i}"), rank, "[]")
                .await
                .unwrap();
        }

        assert_eq!(store.entry_count("3x3").await, RETAINED_PER_BOARD);

        // The retained window is still sorted ascending.
        let top = store.top_range("3x3", 0, RETAINED_PER_BOARD).await.unwrap();
        assert!(top.windows(2).all(|pair| pair[0].1 <= pair[1].1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_same_name_submissions_resolve_to_best() {
        let store = Arc::new(MemoryRankedStore::new());
        let ten = rank::encode(10, T).unwrap();
        let eight = rank::encode(8, T + 1).unwrap();

        let a = {
            let store = store.clone();
            tokio::spawn(async move { store.conditional_insert("3x3", "x", ten, "[]").await })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move { store.conditional_insert("3x3", "x", eight, "[]").await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let top = store.top_range("3x3", 0, 6).await.unwrap();
        assert_eq!(top, vec![("x".to_string(), eight)]);
    }

    #[tokio::test]
    async fn test_reconnect_notification_reaches_subscribers() {
        let store = MemoryRankedStore::new();
        let mut rx = store.subscribe_reconnect();
        store.notify_reconnected();
        assert!(rx.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_top_range_out_of_bounds() {
        let store = MemoryRankedStore::new();
        store.conditional_insert("3x3", "a", rank::encode(5, T).unwrap(), "[]").await.unwrap();

        assert_eq!(store.top_range("3x3", 0, 6).await.unwrap().len(), 1);
        assert!(store.top_range("3x3", 7, 13).await.unwrap().is_empty());
    }
}
