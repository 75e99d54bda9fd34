//! WebSocket message dispatch
//!
//! Validates and routes each client message to the coordinator state.
//! Errors stay local to the requesting connection: they are converted
//! to structured `error` frames here, never propagated upward.

use crate::error::CoordinatorError;
use crate::protocol::{ClientMessage, RoomView, ServerMessage};
use crate::state::AppState;
use std::sync::Arc;

fn error_frame(err: CoordinatorError) -> ServerMessage {
    ServerMessage::Error {
        code: err.code().to_string(),
        msg: err.to_string(),
    }
}

/// Map a unit result onto an optional direct response: success is
/// silent (effects arrive as broadcasts), failure answers the requester.
fn ack(result: Result<(), CoordinatorError>) -> Option<ServerMessage> {
    match result {
        Ok(()) => None,
        Err(err) => Some(error_frame(err)),
    }
}

/// Handle client messages and return optional response for the sender
pub async fn handle_message(
    msg: ClientMessage,
    connection_id: &str,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::CreateRoom {
            display_name,
            settings,
        } => {
            match state
                .create_room(settings, display_name, connection_id.to_string())
                .await
            {
                Ok(room) => Some(ServerMessage::PlayerJoined {
                    room: RoomView::from(&room),
                }),
                Err(err) => Some(error_frame(err)),
            }
        }

        ClientMessage::JoinRoom {
            room_id,
            display_name,
        } => {
            // Success is announced to the whole room, joiner included
            match state
                .join(&room_id, display_name, connection_id.to_string())
                .await
            {
                Ok(_) => None,
                Err(err) => Some(error_frame(err)),
            }
        }

        ClientMessage::LeaveGame { room_id } => ack(state.leave(&room_id, connection_id).await),

        ClientMessage::StartGame { room_id } => {
            ack(state.start_game(&room_id, connection_id).await)
        }

        ClientMessage::UseHonestButton { room_id } => {
            ack(state.reveal_answer(&room_id, Some(connection_id)).await)
        }

        ClientMessage::StartVoting { room_id } => {
            ack(state.start_voting(&room_id, connection_id).await)
        }

        ClientMessage::Vote {
            room_id,
            honest_guess_id,
            deceiver_guess_id,
        } => ack(
            state
                .submit_vote(&room_id, connection_id, honest_guess_id, deceiver_guess_id)
                .await,
        ),

        ClientMessage::NextGame { room_id } => {
            ack(state.advance_round(&room_id, Some(connection_id)).await)
        }

        ClientMessage::GetRooms => Some(ServerMessage::RoomList {
            rooms: state.room_list_snapshot().await,
        }),

        ClientMessage::ChatMessage {
            room_id,
            content,
            sender,
        } => ack(state.relay_chat(&room_id, content, sender).await),

        ClientMessage::JoinVoice {
            room_id,
            peer_handle,
        } => ack(state.join_voice(&room_id, connection_id, peer_handle).await),

        ClientMessage::LeaveVoice { room_id } => {
            state.leave_voice(&room_id, connection_id).await;
            None
        }

        ClientMessage::StorePeerId {
            room_id,
            peer_handle,
        } => ack(
            state
                .store_peer_handle(&room_id, connection_id, peer_handle)
                .await,
        ),
    }
}
