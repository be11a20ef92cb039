//! Player lookup for reconnecting clients.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use super::AppState;

/// Where a player sits, so a dropped client can reconnect to its room.
///
/// # Response
///
/// `200 OK` with `{"room_id", "user_id", "chips"}`, or `404 Not Found` when
/// the player is not seated anywhere.
pub async fn reconnect_info(
    Path(user_addr): Path<String>,
    State(state): State<AppState>,
) -> Response {
    match state.registry.player_info(&user_addr).await {
        Some(info) => Json(info).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Player not seated" })),
        )
            .into_response(),
    }
}
