//! Irori messaging router.
//!
//! Authenticates WebSocket connections with a JWT, then routes channel
//! messages, direct messages, presence and typing indicators between them.
//!
//! Run with:
//! ```not_rust
//! JWT_SECRET=dev-secret cargo run --bin irori-server
//! cargo run --bin irori-server -- --jwt-secret dev-secret --port 3000 --channel general,dev
//! ```

use std::sync::Arc;

use clap::Parser;
use irori_server::{
    config::ServerConfig, infrastructure::identity::JwtIdentityVerifier,
    infrastructure::repository::InMemoryMessageStore, ui::AppState, ui::Server,
};
use irori_shared::{logger::setup_logger, time::SystemClock};

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_BIN_NAME"),
        &config.log_level,
    );

    // Initialize dependencies in order:
    // 1. MessageStore
    // 2. IdentityVerifier
    // 3. AppState (ChatHub, MessagePusher, UseCases)
    // 4. Server

    // 1. Create MessageStore (in-memory database)
    let channels = match config.seed_channels() {
        Ok(channels) => channels,
        Err(e) => {
            tracing::error!("Invalid channel configuration: {}", e);
            std::process::exit(1);
        }
    };
    let clock = Arc::new(SystemClock);
    let store = Arc::new(InMemoryMessageStore::with_channels(clock.clone(), channels));
    tracing::info!("Seeded channels: {}", config.channels.join(", "));

    // 2. Create IdentityVerifier (HS256 JWT)
    let verifier = Arc::new(JwtIdentityVerifier::new(&config.jwt_secret));

    // 3. Wire use cases
    let state = AppState::new(store, verifier, clock, config.router_config());

    // 4. Create and run the server
    let server = Server::new(state);
    if let Err(e) = server.run(config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
