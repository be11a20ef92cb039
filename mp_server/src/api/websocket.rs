//! WebSocket transport for room occupants.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws?id=<user>&name=<display name>`
//! 2. A player already seated somewhere gets its seat back on this socket;
//!    anyone else becomes a fresh, unseated occupant
//! 3. The dispatch loop routes the client's messages until the socket
//!    closes, then the occupant leaves its room unless it reconnected
//!
//! # Client Messages
//!
//! Messages are JSON objects tagged by `type`:
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:6969/ws?id=0xabc&name=alice');
//!
//! // Take a seat
//! ws.send(JSON.stringify({ type: "presence", from: "0xabc", action: "join", payload: "lobby" }));
//!
//! // Answer a prompt: negative folds, zero checks, otherwise chips to add
//! ws.send(JSON.stringify({ type: "action", from: "0xabc", amount: "1000" }));
//! ```

use async_trait::async_trait;
use axum::{
    extract::{
        Query, State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use log::warn;
use mental_poker::room::{Connection, ConnectionError, Message, Occupant, serve_occupant};
use serde::Deserialize;
use std::{sync::Arc, time::Instant};
use tokio::sync::Mutex;

use super::AppState;
use crate::logging::{log_performance, log_room_event};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

/// [`Connection`] over an axum WebSocket carrying JSON text frames
pub struct WsConnection {
    sink: Mutex<SplitSink<WebSocket, WsMessage>>,
    stream: Mutex<SplitStream<WebSocket>>,
}

impl WsConnection {
    pub fn new(socket: WebSocket) -> Self {
        let (sink, stream) = socket.split();
        Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        }
    }
}

#[async_trait]
impl Connection for WsConnection {
    async fn recv(&self) -> Result<Option<Message>, ConnectionError> {
        let mut stream = self.stream.lock().await;
        while let Some(frame) = stream.next().await {
            match frame.map_err(|e| ConnectionError::Transport(e.to_string()))? {
                WsMessage::Text(text) => match serde_json::from_str(text.as_str()) {
                    Ok(message) => return Ok(Some(message)),
                    Err(e) => warn!("Dropping malformed client message: {}", e),
                },
                WsMessage::Close(_) => return Ok(None),
                _ => {}
            }
        }
        Ok(None)
    }

    async fn send(&self, message: &Message) -> Result<(), ConnectionError> {
        let json =
            serde_json::to_string(message).map_err(|e| ConnectionError::Decode(e.to_string()))?;
        self.sink
            .lock()
            .await
            .send(WsMessage::Text(json.into()))
            .await
            .map_err(|e| ConnectionError::Transport(e.to_string()))
    }
}

/// Upgrade an HTTP connection to a player WebSocket.
///
/// # Query Parameters
///
/// - `id`: Player identity (wallet address)
/// - `name`: Display name, defaults to the identity
///
/// # Response
///
/// On success, upgrades to the WebSocket protocol (101 Switching Protocols).
/// An empty identity returns `400 Bad Request`.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    if query.id.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing player id").into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, query, state))
}

/// Attach the socket to an occupant and route its messages until it closes
async fn handle_socket(socket: WebSocket, query: WsQuery, state: AppState) {
    let started = Instant::now();
    let conn: Arc<dyn Connection> = Arc::new(WsConnection::new(socket));

    let (occupant, generation) = match state.registry.find_occupant(&query.id).await {
        Some((room, occupant)) => {
            let generation = occupant.reconnect(conn);
            log_room_event("reconnect", &query.id, Some(room.id()), "Player resumed seat");
            // Re-sends the room state to the new socket
            if let Err(e) = room.join(&occupant, 0).await {
                warn!("Room {}: state resend to {} failed: {}", room.id(), query.id, e);
            }
            (occupant, generation)
        }
        None => {
            let name = query.name.clone().unwrap_or_else(|| query.id.clone());
            let occupant = Occupant::new(query.id.clone(), name, conn);
            log_room_event("connect", &query.id, None, "Player connected");
            let generation = occupant.generation();
            (occupant, generation)
        }
    };

    serve_occupant(occupant, Arc::clone(&state.registry), generation).await;

    log_room_event("disconnect", &query.id, None, "Connection closed");
    log_performance(
        "websocket_session",
        started.elapsed().as_millis() as u64,
        Some(&query.id),
    );
}
