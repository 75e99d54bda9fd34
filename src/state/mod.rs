mod cache;
mod phase;
mod registry;
mod scoring;
mod session;
mod timers;
mod voice;

pub use scoring::{evaluate_vote, winning_player};
pub use timers::TimerPurpose;

use crate::config::CoordinatorConfig;
use crate::protocol::ServerMessage;
use crate::questions::QuestionProvider;
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};

use cache::RoomListCache;
use timers::TimerTable;

/// Shared coordinator state. All maps are mutated only under their own
/// lock; room transitions serialize on the rooms-map write lock.
#[derive(Clone)]
pub struct AppState {
    pub config: CoordinatorConfig,
    pub questions: Arc<dyn QuestionProvider>,
    pub rooms: Arc<RwLock<HashMap<RoomId, Room>>>,
    pub sessions: Arc<RwLock<HashMap<ConnectionId, Session>>>,
    pub closed_rooms: Arc<RwLock<HashMap<RoomId, ClosedRoomRecord>>>,
    pub voice: Arc<RwLock<HashMap<RoomId, Vec<VoicePeer>>>>,
    /// Outbound sender per live connection
    connections: Arc<RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>>>,
    /// Broadcast channel reaching every connected client (room list)
    pub lobby: broadcast::Sender<ServerMessage>,
    timers: TimerTable,
    room_list: RoomListCache,
}

impl AppState {
    pub fn new(config: CoordinatorConfig, questions: Arc<dyn QuestionProvider>) -> Self {
        let (lobby, _rx) = broadcast::channel(100);
        Self {
            config,
            questions,
            rooms: Arc::new(RwLock::new(HashMap::new())),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            closed_rooms: Arc::new(RwLock::new(HashMap::new())),
            voice: Arc::new(RwLock::new(HashMap::new())),
            connections: Arc::new(RwLock::new(HashMap::new())),
            lobby,
            timers: TimerTable::new(),
            room_list: RoomListCache::new(),
        }
    }

    /// Register a connection's outbound channel and hand back the
    /// receiving half for the socket task.
    pub async fn register_connection(
        &self,
        connection_id: &str,
    ) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections
            .write()
            .await
            .insert(connection_id.to_string(), tx);
        rx
    }

    pub async fn unregister_connection(&self, connection_id: &str) {
        self.connections.write().await.remove(connection_id);
    }

    /// Send to a single connection. Send failures mean the socket is
    /// gone; the disconnect path cleans up separately.
    pub async fn send_to(&self, connection_id: &str, msg: ServerMessage) {
        let connections = self.connections.read().await;
        if let Some(tx) = connections.get(connection_id) {
            let _ = tx.send(msg);
        }
    }

    /// Deliver a batch of personalized messages
    pub async fn send_each(&self, messages: Vec<(ConnectionId, ServerMessage)>) {
        let connections = self.connections.read().await;
        for (connection_id, msg) in messages {
            if let Some(tx) = connections.get(&connection_id) {
                let _ = tx.send(msg);
            }
        }
    }

    /// Send the same message to a list of connections
    pub async fn send_all(&self, connection_ids: &[ConnectionId], msg: ServerMessage) {
        let connections = self.connections.read().await;
        for connection_id in connection_ids {
            if let Some(tx) = connections.get(connection_id) {
                let _ = tx.send(msg.clone());
            }
        }
    }

    /// Pass-through chat relay to the room, no state mutation
    pub async fn relay_chat(
        &self,
        room_id: &str,
        content: String,
        sender: String,
    ) -> crate::error::CoordinatorResult<()> {
        let members: Vec<ConnectionId> = {
            let rooms = self.rooms.read().await;
            let Some(room) = rooms.get(room_id) else {
                drop(rooms);
                return Err(self.missing_room_error(room_id).await);
            };
            room.players
                .iter()
                .map(|p| p.connection_id.clone())
                .collect()
        };

        self.send_all(
            &members,
            ServerMessage::ChatMessage {
                room_id: room_id.to_string(),
                content,
                sender,
            },
        )
        .await;
        Ok(())
    }
}
