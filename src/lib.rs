//! # LoopGrid Hiscore Server
//!
//! Real-time per-board leaderboards for the LoopGrid rotation puzzle.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   LOOPGRID HISCORE SERVER                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/             - Pure primitives                         │
//! │  ├── rank.rs       - Composite rank encoding (moves+recency) │
//! │  └── rotation.rs   - Rotation move vocabulary                │
//! │                                                              │
//! │  board/            - Puzzle boards                           │
//! │  ├── mod.rs        - Board capability trait                  │
//! │  └── loopgrid.rs   - Reference loop-grid board               │
//! │                                                              │
//! │  store/            - Ranked persistence                      │
//! │  ├── mod.rs        - RankedStore capability                  │
//! │  └── memory.rs     - In-process store (atomic transactions)  │
//! │                                                              │
//! │  network/          - Synchronization protocol                │
//! │  ├── protocol.rs   - Message types                           │
//! │  ├── session.rs    - Per-board hiscore sessions              │
//! │  └── server.rs     - WebSocket server                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency Guarantee
//!
//! All shared mutable state lives behind the [`store::RankedStore`]
//! capability, whose conditional insert is a single atomic transaction:
//! concurrent submissions for one board never partially apply each other,
//! and two solves under the same name always resolve to the better rank,
//! independent of arrival order. Sessions themselves are stateless between
//! events, so any number of clients can be served concurrently without
//! locks in this crate's protocol layer.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod board;
pub mod core;
pub mod network;
pub mod store;

// Re-export commonly used types
pub use self::board::{Board, LoopGridBoard};
pub use self::core::rank::{RankError, RANK_TIME_CAPACITY_MILLIS};
pub use self::core::rotation::{Axis, Rotation};
pub use self::network::protocol::{ClientMessage, HiscoreRow, ServerMessage, SubmittedResult};
pub use self::network::server::{HiscoreServer, HiscoreServerError, ServerConfig};
pub use self::network::session::{HiscoreSession, SubscriberRegistry};
pub use self::store::{MemoryRankedStore, RankedStore, StoreError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of entries in a pushed hiscore window
pub const HISCORE_WINDOW: usize = 7;

/// Maximum stored length of a player name, in characters
pub const MAX_NAME_CHARS: usize = 8;
