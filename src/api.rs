//! HTTP API endpoints.
//!
//! Read-only fallback for clients without a live socket; the same data
//! flows over the WebSocket as `roomList`.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::protocol::RoomSummary;
use crate::state::AppState;

/// List open rooms.
///
/// GET /api/rooms
pub async fn list_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummary>> {
    Json(state.room_list_snapshot().await)
}
