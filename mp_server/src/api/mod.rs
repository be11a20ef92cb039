//! HTTP/WebSocket API for the room server.
//!
//! # Endpoints Overview
//!
//! - `GET /ws?id=<user>&name=<display name>` - Establish a player connection
//! - `GET /reconnect/{user_addr}` - Room and stack of a seated player
//! - `GET /health` - Server health status
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use mental_poker::{LoggingLedger, RoomConfig, RoomRegistry, StandardEvaluator, HttpCardCrypto};
//! use mp_server::api::{AppState, create_router};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = RoomRegistry::new(
//!     Arc::new(HttpCardCrypto::new("http://127.0.0.1:8000")?),
//!     Arc::new(StandardEvaluator),
//!     Arc::new(LoggingLedger),
//!     RoomConfig::default(),
//! );
//! let app = create_router(AppState { registry });
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:6969").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively. In production, configure appropriate
//! origins, methods, and headers.

pub mod players;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Json},
    routing::get,
};
use mental_poker::RoomRegistry;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket connections.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
}

/// Create the API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler))
        .route("/reconnect/{user_addr}", get(players::reconnect_info))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","version":"0.1.0","rooms":2,"timestamp":"2026-10-16T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "rooms": state.registry.len().await,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
