//! Room registry: creation, lookup, closure, and tombstone sweeping.

use super::AppState;
use crate::error::{CoordinatorError, CoordinatorResult};
use crate::protocol::ServerMessage;
use crate::types::*;
use rand::Rng;

/// Safe character set for room codes (excludes 0/O, 1/I/L to avoid confusion)
const CODE_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 5;

fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

fn validate_settings(settings: &RoomSettings) -> CoordinatorResult<()> {
    if settings.max_players < 3 {
        return Err(CoordinatorError::InvalidSettings(
            "maxPlayers must be at least 3".to_string(),
        ));
    }
    if settings.total_rounds < 1 {
        return Err(CoordinatorError::InvalidSettings(
            "totalRounds must be at least 1".to_string(),
        ));
    }
    if settings.points_to_win <= 0 {
        return Err(CoordinatorError::InvalidSettings(
            "pointsToWin must be positive".to_string(),
        ));
    }
    if settings.answer_view_seconds == 0 {
        return Err(CoordinatorError::InvalidSettings(
            "answerViewSeconds must be positive".to_string(),
        ));
    }
    Ok(())
}

impl AppState {
    /// Create a room with the requester seated as creator (seat 0)
    pub async fn create_room(
        &self,
        settings: RoomSettings,
        display_name: String,
        connection_id: ConnectionId,
    ) -> CoordinatorResult<Room> {
        validate_settings(&settings)?;

        let room = {
            let mut rooms = self.rooms.write().await;

            // Collision is rare with 24M codes; retry until unique
            let id = loop {
                let code = generate_room_code();
                if !rooms.contains_key(&code) {
                    break code;
                }
            };

            let mut room = Room::new(id.clone(), settings);
            room.players
                .push(Player::new(connection_id.clone(), display_name.clone()));
            rooms.insert(id, room.clone());
            room
        };

        self.sessions.write().await.insert(
            connection_id.clone(),
            Session {
                connection_id,
                room_id: room.id.clone(),
                display_name,
            },
        );

        tracing::info!("Room {} created by {}", room.id, room.players[0].display_name);
        self.invalidate_room_list().await;
        Ok(room)
    }

    /// Remove a room from the live map, leaving a tombstone behind and
    /// telling every remaining member why.
    pub async fn close_room(&self, room_id: &str, reason: &str) {
        let room = match self.rooms.write().await.remove(room_id) {
            Some(room) => room,
            // Already closed; a racing leave/disconnect got here first
            None => return,
        };

        self.closed_rooms.write().await.insert(
            room_id.to_string(),
            ClosedRoomRecord {
                room_id: room_id.to_string(),
                reason: reason.to_string(),
                closed_at: chrono::Utc::now(),
            },
        );

        self.cancel_room_timers(room_id).await;
        self.sessions
            .write()
            .await
            .retain(|_, session| session.room_id != room_id);
        self.voice.write().await.remove(room_id);

        let members: Vec<ConnectionId> = room
            .players
            .iter()
            .map(|p| p.connection_id.clone())
            .collect();
        self.send_all(
            &members,
            ServerMessage::RoomClosed {
                room_id: room_id.to_string(),
                reason: reason.to_string(),
            },
        )
        .await;

        tracing::info!("Room {} closed: {}", room_id, reason);
        self.invalidate_room_list().await;
    }

    /// Error for an id that is not in the live map: distinguishes a
    /// recently closed room from one that never existed.
    pub async fn missing_room_error(&self, room_id: &str) -> CoordinatorError {
        match self.closed_rooms.read().await.get(room_id) {
            Some(record) => CoordinatorError::RoomClosed {
                reason: record.reason.clone(),
            },
            None => CoordinatorError::RoomNotFound(room_id.to_string()),
        }
    }

    /// Drop tombstones older than the configured TTL
    pub async fn sweep_closed_rooms(&self) {
        let cutoff = chrono::Utc::now()
            - chrono::Duration::from_std(self.config.closed_room_ttl)
                .unwrap_or_else(|_| chrono::Duration::hours(1));

        let mut closed = self.closed_rooms.write().await;
        let before = closed.len();
        closed.retain(|_, record| record.closed_at > cutoff);
        let dropped = before - closed.len();
        if dropped > 0 {
            tracing::debug!("Swept {} expired closed-room records", dropped);
        }
    }
}
