//! Backend of a vouching platform: players endorse or flag each other per game and the totals
//! become a public reputation and leaderboard.
//!
//!
//!
//! # Endpoints
//!
//! | method | path           | purpose |
//! |--------|----------------|---------|
//! | POST   | `/vouches`     | create a vouch, JSON body |
//! | GET    | `/vouches`     | `user_id`, `direction` (`received`/`given`), `page`, `limit` |
//! | GET    | `/cooldown`    | `voucher_id`, `target_id`, `game_id`, wait until the next vouch |
//! | GET    | `/reputation`  | `user_id`, reputation and tier |
//! | GET    | `/leaderboard` | `sort` (`reputation`/`vouches`/`positive`/`recent`), `page`, `limit` |
//!
//! Pagination is 1-based, `limit` defaults to 50 and is capped at 100.
//!
//!
//!
//! # Limits
//!
//! - One vouch per (voucher, target, game) per UTC date
//! - At most two per (voucher, target, game) in any rolling 48 hours
//! - Nobody vouches for themselves
//! - Negative reputation can not vouch, under 100 moves the target by 1, from 100 on by 10
//!
//! Redis checks both rate limits inside the write. The cooldown numbers shown to users come from
//! the `vouch` crate and are only advice.
//!
//!
//!
//! # Setup
//!
//! Environment.
//! ```sh
//! RUST_PORT=8080
//! REDIS_URL=redis://redis:6379
//! CORS_MAX_AGE=3600
//! RUST_LOG=info
//! ```
//!
//! Run.
//! ```sh
//! cargo run -p vouch-server
//! ```
//!
//! Try it.
//! ```sh
//! curl -X POST localhost:8080/vouches -H 'content-type: application/json' \
//!   -d '{"voucher_id":"alice","target_id":"bob","game_id":"chess","vouch_type":"positive"}'
//! curl 'localhost:8080/cooldown?voucher_id=alice&target_id=bob&game_id=chess'
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::get,
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod memory;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;
pub mod vouching;

use routes::{
    cooldown_handler, create_vouch_handler, leaderboard_handler, reputation_handler,
    vouches_handler,
};
use state::State;

pub fn app(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(state.config.cors_max_age));

    Router::new()
        .route("/vouches", get(vouches_handler).post(create_vouch_handler))
        .route("/cooldown", get(cooldown_handler))
        .route("/reputation", get(reputation_handler))
        .route("/leaderboard", get(leaderboard_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() -> Result<(), anyhow::Error> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down...");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
