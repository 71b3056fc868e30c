//! Shopsync reference server
//!
//! Serves the shopping list API that the sync engine's HTTP client
//! consumes. Storage is in memory; this binary exists for development
//! and manual testing against a real server.
//!
//! # Configuration
//!
//! Environment variables:
//! - `SHOPSYNC_PORT`: Port to listen on (default: 8080)
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint
//! - `GET /api/shopping-items`: Full item list
//! - `POST /api/shopping-items`: Create (or replace) one item
//! - `PUT /api/shopping-items/{id}`: Update one item
//! - `DELETE /api/shopping-items/{id}`: Delete one item

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopsync::server::{router, AppState, ServerStorage};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shopsync=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = std::env::var("SHOPSYNC_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let state = AppState {
        storage: Arc::new(ServerStorage::new()),
    };
    let app = router(state).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
