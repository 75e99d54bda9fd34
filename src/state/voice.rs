//! Voice sub-channel membership.
//!
//! Entirely decoupled from game phase: peers can join or leave voice in
//! any phase. The peer handle is opaque WebRTC signaling data; the
//! coordinator stores it and relays membership, nothing more.

use super::AppState;
use crate::error::CoordinatorResult;
use crate::protocol::ServerMessage;
use crate::types::*;

impl AppState {
    /// Add a connection to the room's voice channel and announce the
    /// updated membership.
    pub async fn join_voice(
        &self,
        room_id: &str,
        connection_id: &str,
        peer_handle: Option<String>,
    ) -> CoordinatorResult<()> {
        if !self.rooms.read().await.contains_key(room_id) {
            return Err(self.missing_room_error(room_id).await);
        }

        {
            let mut voice = self.voice.write().await;
            let peers = voice.entry(room_id.to_string()).or_default();
            match peers.iter_mut().find(|p| p.connection_id == connection_id) {
                Some(peer) => {
                    if let Some(handle) = peer_handle {
                        peer.peer_handle = handle;
                    }
                }
                None => peers.push(VoicePeer {
                    connection_id: connection_id.to_string(),
                    peer_handle: peer_handle.unwrap_or_default(),
                }),
            }
        }

        self.broadcast_voice_users(room_id).await;
        Ok(())
    }

    /// Attach or replace the opaque peer handle for a connection. Also
    /// enrolls the connection if the handle arrives before join.
    pub async fn store_peer_handle(
        &self,
        room_id: &str,
        connection_id: &str,
        peer_handle: String,
    ) -> CoordinatorResult<()> {
        self.join_voice(room_id, connection_id, Some(peer_handle))
            .await
    }

    pub async fn leave_voice(&self, room_id: &str, connection_id: &str) {
        if self.remove_voice_peer(room_id, connection_id).await {
            self.broadcast_voice_users(room_id).await;
        }
    }

    /// Drop a connection's voice entry without broadcasting. Returns
    /// whether anything was removed.
    pub(super) async fn remove_voice_peer(&self, room_id: &str, connection_id: &str) -> bool {
        let mut voice = self.voice.write().await;
        let Some(peers) = voice.get_mut(room_id) else {
            return false;
        };
        let before = peers.len();
        peers.retain(|p| p.connection_id != connection_id);
        let removed = peers.len() < before;
        if peers.is_empty() {
            voice.remove(room_id);
        }
        removed
    }

    async fn broadcast_voice_users(&self, room_id: &str) {
        let users = self
            .voice
            .read()
            .await
            .get(room_id)
            .cloned()
            .unwrap_or_default();
        let members: Vec<ConnectionId> = {
            let rooms = self.rooms.read().await;
            match rooms.get(room_id) {
                Some(room) => room
                    .players
                    .iter()
                    .map(|p| p.connection_id.clone())
                    .collect(),
                None => return,
            }
        };

        self.send_all(
            &members,
            ServerMessage::VoiceUsers {
                room_id: room_id.to_string(),
                users,
            },
        )
        .await;
    }
}
