//! LoopGrid Hiscore Server
//!
//! Serves per-board leaderboards over WebSocket and keeps connected
//! clients synchronized with the current top entries.

use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use loopgrid::{
    board::{Board, LoopGridBoard},
    core::rotation::Rotation,
    network::server::{HiscoreServer, ServerConfig},
    store::MemoryRankedStore,
    HISCORE_WINDOW, VERSION,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("LoopGrid Hiscore Server v{}", VERSION);
    info!("Top window size: {}", HISCORE_WINDOW);

    let mut config = ServerConfig::default();
    if let Ok(addr) = std::env::var("LOOPGRID_ADDR") {
        config.bind_addr = addr.parse()?;
    }

    let store = Arc::new(MemoryRankedStore::new());
    let mut server = HiscoreServer::new(config, store);

    for board in demo_boards() {
        info!("Serving hiscores for board '{}'", board.name());
        server.register_board(board);
    }

    server.run().await?;
    Ok(())
}

/// The boards this deployment serves.
fn demo_boards() -> Vec<Arc<LoopGridBoard>> {
    vec![
        Arc::new(LoopGridBoard::new(
            "3x3",
            3,
            vec![Rotation::row(0, 1), Rotation::col(2, -1), Rotation::row(1, 2)],
        )),
        Arc::new(LoopGridBoard::new(
            "4x4",
            4,
            vec![
                Rotation::col(0, 2),
                Rotation::row(3, -1),
                Rotation::col(1, 1),
                Rotation::row(0, 3),
            ],
        )),
        Arc::new(LoopGridBoard::new(
            "5x5",
            5,
            vec![
                Rotation::row(2, 2),
                Rotation::col(4, -2),
                Rotation::row(0, 1),
                Rotation::col(2, 3),
                Rotation::row(4, -1),
            ],
        )),
    ]
}
