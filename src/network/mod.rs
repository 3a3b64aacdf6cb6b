//! Network Layer
//!
//! WebSocket transport for real-time hiscore synchronization. Everything
//! stateful and shared lives in the store; this layer only wires client
//! channels to per-board sessions.

pub mod protocol;
pub mod session;
pub mod server;

pub use protocol::{ClientMessage, ServerMessage, SubmittedResult, HiscoreRow};
pub use session::{HiscoreSession, SubscriberRegistry, ValidationError, ConnectionId};
pub use server::{HiscoreServer, ServerConfig, HiscoreServerError};
