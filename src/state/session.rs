//! Session and reconnection management.
//!
//! `display_name` is the identity that survives transport churn: a join
//! with a name already seated in the room re-binds that seat to the new
//! connection instead of creating a second player.

use super::AppState;
use crate::error::{CoordinatorError, CoordinatorResult};
use crate::protocol::{RoomView, ServerMessage};
use crate::types::*;

enum LeaveEffect {
    /// Room survives; notify the remaining roster
    Roster(RoomView, Vec<ConnectionId>),
    /// Room must close with this reason
    Close(&'static str),
    /// Player was not in the room (raced a disconnect); nothing to do
    AlreadyGone,
}

impl AppState {
    /// Seat a player, or re-bind an existing seat on reconnect
    pub async fn join(
        &self,
        room_id: &str,
        display_name: String,
        connection_id: ConnectionId,
    ) -> CoordinatorResult<Player> {
        let (player, view, members, replaced_connection) = {
            let mut rooms = self.rooms.write().await;
            let Some(room) = rooms.get_mut(room_id) else {
                drop(rooms);
                return Err(self.missing_room_error(room_id).await);
            };

            let (player, replaced_connection) = if let Some(seated) = room
                .players
                .iter_mut()
                .find(|p| p.display_name == display_name)
            {
                // Reconnection: same seat, same score, new transport
                let old = std::mem::replace(&mut seated.connection_id, connection_id.clone());
                tracing::info!(
                    "{} reconnected to room {} ({} -> {})",
                    display_name,
                    room_id,
                    old,
                    connection_id
                );
                (seated.clone(), Some(old))
            } else {
                if room.is_full() {
                    return Err(CoordinatorError::RoomFull(room_id.to_string()));
                }
                if room.phase != RoomPhase::Waiting {
                    return Err(CoordinatorError::GameAlreadyStarted(room_id.to_string()));
                }
                let seated = Player::new(connection_id.clone(), display_name.clone());
                room.players.push(seated.clone());
                (seated, None)
            };
            let members: Vec<ConnectionId> = room
                .players
                .iter()
                .map(|p| p.connection_id.clone())
                .collect();
            (player, RoomView::from(&*room), members, replaced_connection)
        };

        {
            let mut sessions = self.sessions.write().await;
            if let Some(old) = &replaced_connection {
                sessions.remove(old);
            }
            sessions.insert(
                connection_id.clone(),
                Session {
                    connection_id: connection_id.clone(),
                    room_id: room_id.to_string(),
                    display_name,
                },
            );
        }
        if let Some(old) = &replaced_connection {
            // The old transport's voice peer is dead with it
            self.remove_voice_peer(room_id, old).await;
        }

        self.send_all(&members, ServerMessage::PlayerJoined { room: view })
            .await;
        self.invalidate_room_list().await;
        Ok(player)
    }

    /// Remove a player by connection identity. Creator leave or an
    /// emptied room closes it; otherwise the roster is re-broadcast.
    pub async fn leave(&self, room_id: &str, connection_id: &str) -> CoordinatorResult<()> {
        let effect = {
            let mut rooms = self.rooms.write().await;
            let Some(room) = rooms.get_mut(room_id) else {
                drop(rooms);
                return Err(self.missing_room_error(room_id).await);
            };

            match room
                .players
                .iter()
                .position(|p| p.connection_id == connection_id)
            {
                Some(seat) => {
                    let player = room.players.remove(seat);
                    tracing::info!("{} left room {}", player.display_name, room_id);
                    if seat == 0 {
                        LeaveEffect::Close("the host left the game")
                    } else if room.players.is_empty() {
                        LeaveEffect::Close("everyone left the game")
                    } else {
                        let members = room
                            .players
                            .iter()
                            .map(|p| p.connection_id.clone())
                            .collect();
                        LeaveEffect::Roster(RoomView::from(&*room), members)
                    }
                }
                None => LeaveEffect::AlreadyGone,
            }
        };

        self.sessions.write().await.remove(connection_id);
        self.remove_voice_peer(room_id, connection_id).await;

        match effect {
            LeaveEffect::Close(reason) => self.close_room(room_id, reason).await,
            LeaveEffect::Roster(view, members) => {
                self.send_all(&members, ServerMessage::PlayerLeft { room: view })
                    .await;
                self.invalidate_room_list().await;
            }
            LeaveEffect::AlreadyGone => {}
        }
        Ok(())
    }

    /// Transport-level loss. Same effect as an explicit leave, resolved
    /// through the session table; idempotent with a racing `leave`.
    pub async fn disconnect(&self, connection_id: &str) {
        let session = self.sessions.read().await.get(connection_id).cloned();
        let Some(session) = session else {
            // Unknown or already cleaned up (explicit leave won the race)
            return;
        };

        if let Err(err) = self.leave(&session.room_id, connection_id).await {
            tracing::debug!(
                "Disconnect cleanup for {} in room {}: {}",
                connection_id,
                session.room_id,
                err
            );
        }
    }
}
