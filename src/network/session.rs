//! Hiscore Session Management
//!
//! One session exists per (board, client channel) pairing and owns the
//! synchronization protocol for it: validating submitted solves, writing
//! accepted ones through the store's conditional-insert transaction, and
//! pushing the top window to the bound client and to every other subscriber
//! of the board.
//!
//! Sessions hold no state between events beyond their bindings; everything
//! shared and mutable lives in the store.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::board::Board;
use crate::core::rank;
use crate::core::rotation;
use crate::network::protocol::{HiscoreRow, ServerMessage, SubmittedResult};
use crate::store::RankedStore;
use crate::{HISCORE_WINDOW, MAX_NAME_CHARS};

/// Identifies one client connection across the subscriber registry.
pub type ConnectionId = Uuid;

/// Why a submission was refused. Rejections are logged and never surfaced
/// to any client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Player name is empty after trimming.
    #[error("player name is empty")]
    EmptyName,

    /// Claimed move count does not match the sequence.
    #[error("rotation count mismatch: claimed {claimed}, sequence has {actual}")]
    RotationCountMismatch {
        /// Count stated in the submission.
        claimed: usize,
        /// Actual sequence length.
        actual: usize,
    },

    /// Replaying the sequence does not solve the board.
    #[error("sequence does not solve the board")]
    NotSolved,
}

// =============================================================================
// SUBSCRIBER REGISTRY
// =============================================================================

/// Which connections currently receive unsolicited window pushes for which
/// board. Shared by all sessions of a server.
#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: RwLock<BTreeMap<String, BTreeMap<ConnectionId, mpsc::Sender<ServerMessage>>>>,
}

impl SubscriberRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `connection` as a subscriber of `board`.
    pub async fn subscribe(
        &self,
        board: &str,
        connection: ConnectionId,
        sender: mpsc::Sender<ServerMessage>,
    ) {
        let mut subscribers = self.subscribers.write().await;
        subscribers
            .entry(board.to_string())
            .or_default()
            .insert(connection, sender);
    }

    /// Drop `connection`'s subscription to `board`. Idempotent.
    pub async fn unsubscribe(&self, board: &str, connection: ConnectionId) {
        let mut subscribers = self.subscribers.write().await;
        if let Some(board_subscribers) = subscribers.get_mut(board) {
            board_subscribers.remove(&connection);
            if board_subscribers.is_empty() {
                subscribers.remove(board);
            }
        }
    }

    /// Send `message` to every subscriber of `board` except `exclude`.
    /// Sends to closed channels are ignored; teardown prunes the entries.
    pub async fn broadcast_except(
        &self,
        board: &str,
        exclude: ConnectionId,
        message: ServerMessage,
    ) {
        let targets: Vec<mpsc::Sender<ServerMessage>> = {
            let subscribers = self.subscribers.read().await;
            match subscribers.get(board) {
                Some(board_subscribers) => board_subscribers
                    .iter()
                    .filter(|(id, _)| **id != exclude)
                    .map(|(_, sender)| sender.clone())
                    .collect(),
                None => return,
            }
        };

        for sender in targets {
            let _ = sender.send(message.clone()).await;
        }
    }

    /// Number of live subscriptions for `board`.
    pub async fn subscriber_count(&self, board: &str) -> usize {
        let subscribers = self.subscribers.read().await;
        subscribers.get(board).map(BTreeMap::len).unwrap_or(0)
    }
}

// =============================================================================
// HISCORE SESSION
// =============================================================================

/// Protocol handler for one board on one client connection.
pub struct HiscoreSession {
    connection_id: ConnectionId,
    board: Arc<dyn Board>,
    store: Arc<dyn RankedStore>,
    subscribers: Arc<SubscriberRegistry>,
    client: mpsc::Sender<ServerMessage>,
}

impl HiscoreSession {
    /// Open a session, subscribing the client channel to the board's
    /// unsolicited pushes.
    pub async fn open(
        connection_id: ConnectionId,
        board: Arc<dyn Board>,
        store: Arc<dyn RankedStore>,
        subscribers: Arc<SubscriberRegistry>,
        client: mpsc::Sender<ServerMessage>,
    ) -> Self {
        subscribers
            .subscribe(board.name(), connection_id, client.clone())
            .await;
        Self {
            connection_id,
            board,
            store,
            subscribers,
            client,
        }
    }

    /// Name of the bound board.
    pub fn board_name(&self) -> &str {
        self.board.name()
    }

    /// Handle a submitted solve.
    ///
    /// Invalid or unencodable results are dropped with a diagnostic and
    /// nothing else happens. Valid results go through the store's
    /// conditional insert (failures logged and swallowed), after which the
    /// current top window is pushed to the submitter and broadcast to every
    /// other subscriber of the board. The push goes out even if the write
    /// did not land; it carries the latest known state.
    pub async fn on_result_submitted(&self, result: SubmittedResult) {
        if let Err(e) = self.validate(&result) {
            debug!("Dropping invalid submission for '{}': {}", self.board.name(), e);
            return;
        }

        let timestamp = Utc::now().timestamp_millis().max(0) as u64;
        let rank = match rank::encode(result.rotations.len() as u32, timestamp) {
            Ok(rank) => rank,
            Err(e) => {
                warn!("Dropping submission for '{}': {}", self.board.name(), e);
                return;
            }
        };

        let name = storage_name(&result.name);
        match rotation::serialize_sequence(&result.rotations) {
            Ok(serialized) => {
                if let Err(e) = self
                    .store
                    .conditional_insert(self.board.name(), &name, rank, &serialized)
                    .await
                {
                    // Submitters never learn about write failures; the push
                    // below still carries the last known window.
                    warn!("Hiscore write failed for '{}': {}", self.board.name(), e);
                }
            }
            Err(e) => {
                warn!("Could not serialize rotation sequence for '{}': {}", self.board.name(), e);
            }
        }

        let Some(message) = self.window_message().await else {
            return;
        };
        self.push(message.clone()).await;
        self.subscribers
            .broadcast_except(self.board.name(), self.connection_id, message)
            .await;
    }

    /// Handle an explicit window request: push to the bound client only.
    pub async fn on_top_requested(&self) {
        if let Some(message) = self.window_message().await {
            self.push(message).await;
        }
    }

    /// Handle renewed store availability: writes queued during the outage
    /// may have changed the window, so re-push it to the bound client.
    pub async fn on_store_reconnected(&self) {
        if let Some(message) = self.window_message().await {
            self.push(message).await;
        }
    }

    /// Release the board subscription. Idempotent; safe after partial setup
    /// and on repeated calls.
    pub async fn on_disconnected(&self) {
        self.subscribers
            .unsubscribe(self.board.name(), self.connection_id)
            .await;
    }

    fn validate(&self, result: &SubmittedResult) -> Result<(), ValidationError> {
        if result.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if result.n_rotations != result.rotations.len() {
            return Err(ValidationError::RotationCountMismatch {
                claimed: result.n_rotations,
                actual: result.rotations.len(),
            });
        }
        if !self.board.is_solved_by(&result.rotations) {
            return Err(ValidationError::NotSolved);
        }
        Ok(())
    }

    /// Read the current top window and shape it for the wire. A failed read
    /// degrades to no push.
    async fn window_message(&self) -> Option<ServerMessage> {
        let range = match self
            .store
            .top_range(self.board.name(), 0, HISCORE_WINDOW - 1)
            .await
        {
            Ok(range) => range,
            Err(e) => {
                warn!("Hiscore read failed for '{}', skipping push: {}", self.board.name(), e);
                return None;
            }
        };

        let entries = range
            .into_iter()
            .map(|(name, rank)| HiscoreRow {
                name,
                n_rotations: rank::decode(rank),
            })
            .collect();

        Some(ServerMessage::HiscoresFor {
            board: self.board.name().to_string(),
            entries,
        })
    }

    /// Push to the bound client. Late completions after a disconnect land
    /// on a closed channel and are discarded here.
    async fn push(&self, message: ServerMessage) {
        let _ = self.client.send(message).await;
    }
}

/// Shape a submitted name for storage: strip surrounding whitespace, keep
/// at most [`MAX_NAME_CHARS`] characters.
fn storage_name(raw: &str) -> String {
    raw.trim().chars().take(MAX_NAME_CHARS).collect()
}
