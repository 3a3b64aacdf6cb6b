//! WebSocket Hiscore Server
//!
//! Transport adapter between browser clients and the hiscore sessions.
//! One task per connection; inbound events are dispatched to the
//! connection's per-board sessions, and store-reconnect notifications
//! trigger a re-push of every board the connection subscribes to.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::board::Board;
use crate::network::protocol::{ClientMessage, ServerMessage};
use crate::network::session::{ConnectionId, HiscoreSession, SubscriberRegistry};
use crate::store::RankedStore;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Connection timeout (WebSocket handshake).
    pub handshake_timeout: Duration,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".parse().unwrap(),
            max_connections: 1000,
            handshake_timeout: Duration::from_secs(10),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Hiscore server errors.
#[derive(Debug, thiserror::Error)]
pub enum HiscoreServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// The hiscore server.
pub struct HiscoreServer {
    /// Server configuration.
    config: ServerConfig,
    /// Boards served, keyed by name.
    boards: BTreeMap<String, Arc<dyn Board>>,
    /// Injected ranked store shared by all sessions.
    store: Arc<dyn RankedStore>,
    /// Per-board broadcast registry.
    subscribers: Arc<SubscriberRegistry>,
    /// Live connection count.
    connection_count: Arc<AtomicUsize>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl HiscoreServer {
    /// Create a new server over an injected store.
    pub fn new(config: ServerConfig, store: Arc<dyn RankedStore>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            boards: BTreeMap::new(),
            store,
            subscribers: Arc::new(SubscriberRegistry::new()),
            connection_count: Arc::new(AtomicUsize::new(0)),
            shutdown_tx,
        }
    }

    /// Serve hiscores for `board`. Messages naming unregistered boards are
    /// dropped.
    pub fn register_board(&mut self, board: Arc<dyn Board>) {
        self.boards.insert(board.name().to_string(), board);
    }

    /// Run the server.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), HiscoreServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!(
            "Hiscore server v{} listening on {} ({} boards)",
            self.config.version,
            self.config.bind_addr,
            self.boards.len()
        );

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            if self.connection_count.load(Ordering::Relaxed) >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let boards = self.boards.clone();
        let store = self.store.clone();
        let subscribers = self.subscribers.clone();
        let connection_count = self.connection_count.clone();
        let handshake_timeout = self.config.handshake_timeout;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match tokio::time::timeout(handshake_timeout, accept_async(stream)).await {
                Ok(Ok(ws)) => ws,
                Ok(Err(e)) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
                Err(_) => {
                    warn!("WebSocket handshake timed out for {}", addr);
                    return;
                }
            };

            connection_count.fetch_add(1, Ordering::Relaxed);

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(64);
            let connection_id: ConnectionId = Uuid::new_v4();

            // Spawn message sender task
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            // Sessions this connection has opened, one per board.
            let mut sessions: BTreeMap<String, HiscoreSession> = BTreeMap::new();
            let mut reconnect_rx = store.subscribe_reconnect();
            let mut reconnect_open = true;

            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                let client_msg = match ClientMessage::from_json(&text) {
                                    Ok(m) => m,
                                    Err(e) => {
                                        // Malformed payloads are dropped like
                                        // any other invalid submission.
                                        debug!("Invalid message from {}: {}", addr, e);
                                        continue;
                                    }
                                };

                                Self::dispatch(
                                    connection_id,
                                    client_msg,
                                    &boards,
                                    &store,
                                    &subscribers,
                                    &msg_tx,
                                    &mut sessions,
                                    addr,
                                ).await;
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                error!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    result = reconnect_rx.recv(), if reconnect_open => {
                        match result {
                            // A lagged receiver just collapses several
                            // notifications into one re-push.
                            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                                debug!("Store reconnected, re-pushing {} boards to {}", sessions.len(), addr);
                                for session in sessions.values() {
                                    session.on_store_reconnected().await;
                                }
                            }
                            Err(broadcast::error::RecvError::Closed) => {
                                reconnect_open = false;
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            // Release board subscriptions before tearing the channel down.
            for session in sessions.values() {
                session.on_disconnected().await;
            }

            sender_task.abort();
            connection_count.fetch_sub(1, Ordering::Relaxed);
            info!("Client {} cleaned up", addr);
        });
    }

    /// Route one inbound message to the right session, opening it on first
    /// reference to a board.
    #[allow(clippy::too_many_arguments)]
    async fn dispatch(
        connection_id: ConnectionId,
        msg: ClientMessage,
        boards: &BTreeMap<String, Arc<dyn Board>>,
        store: &Arc<dyn RankedStore>,
        subscribers: &Arc<SubscriberRegistry>,
        sender: &mpsc::Sender<ServerMessage>,
        sessions: &mut BTreeMap<String, HiscoreSession>,
        addr: SocketAddr,
    ) {
        let board_name = match &msg {
            ClientMessage::HiscoreFor { board, .. } => board.clone(),
            ClientMessage::RequestHiscoresFor { board } => board.clone(),
        };

        if !sessions.contains_key(&board_name) {
            let Some(board) = boards.get(&board_name) else {
                debug!("Client {} referenced unknown board '{}'", addr, board_name);
                return;
            };
            let session = HiscoreSession::open(
                connection_id,
                board.clone(),
                store.clone(),
                subscribers.clone(),
                sender.clone(),
            )
            .await;
            sessions.insert(board_name.clone(), session);
        }

        let Some(session) = sessions.get(&board_name) else {
            return;
        };

        match msg {
            ClientMessage::HiscoreFor { result, .. } => {
                session.on_result_submitted(result).await;
            }
            ClientMessage::RequestHiscoresFor { .. } => {
                session.on_top_requested().await;
            }
        }
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub fn connection_count(&self) -> usize {
        self.connection_count.load(Ordering::Relaxed)
    }

    /// Number of registered boards.
    pub fn board_count(&self) -> usize {
        self.boards.len()
    }
}
