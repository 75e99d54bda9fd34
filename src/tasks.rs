use crate::protocol::ServerMessage;
use crate::state::AppState;
use std::sync::Arc;

/// Spawn a background task that pushes the room list to all connected
/// clients whenever it has been invalidated, at most once per debounce
/// window.
pub fn spawn_room_list_broadcaster(state: Arc<AppState>) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(state.config.room_list_debounce).await;

            if !state.take_room_list_dirty() {
                continue;
            }

            let rooms = state.room_list_snapshot().await;

            // Ignore send errors (no receivers connected is fine)
            let _ = state.lobby.send(ServerMessage::RoomList { rooms });
        }
    });
}

/// Spawn a background task that garbage-collects expired closed-room
/// tombstones on a fixed interval.
pub fn spawn_closed_room_sweeper(state: Arc<AppState>) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(state.config.sweep_interval).await;
            state.sweep_closed_rooms().await;
        }
    });
}
