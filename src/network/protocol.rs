//! Protocol Messages
//!
//! Wire format for hiscore synchronization over WebSocket. All messages are
//! JSON text frames; the `type` tag carries the event name the clients
//! dispatch on.

use serde::{Deserialize, Serialize};

use crate::core::rotation::Rotation;

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// A finished solve submitted for a board's leaderboard.
    #[serde(rename = "hiscore-for")]
    HiscoreFor {
        /// Board the solve belongs to.
        board: String,
        /// The submitted solve.
        result: SubmittedResult,
    },

    /// Explicit request for the current top window of a board.
    #[serde(rename = "request-hiscores-for")]
    RequestHiscoresFor {
        /// Board whose window is requested.
        board: String,
    },
}

/// A solve result as submitted by a client. Ephemeral: consumed once by
/// validation, never stored in this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedResult {
    /// Player name as typed; trimmed and truncated before storage.
    pub name: String,
    /// The ordered move sequence claimed to solve the board.
    pub rotations: Vec<Rotation>,
    /// Claimed move count; must equal `rotations.len()`.
    pub n_rotations: usize,
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// The current top window for a board, ascending by rank.
    #[serde(rename = "hiscores-for")]
    HiscoresFor {
        /// Board the window belongs to.
        board: String,
        /// At most [`crate::HISCORE_WINDOW`] entries, best first.
        entries: Vec<HiscoreRow>,
    },
}

/// One visible leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiscoreRow {
    /// Stored player name (trimmed, at most 8 characters).
    pub name: String,
    /// Move count of the solve.
    pub n_rotations: u32,
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
