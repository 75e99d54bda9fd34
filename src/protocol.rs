use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Create a room and seat the sender at seat 0
    #[serde(rename_all = "camelCase")]
    CreateRoom {
        display_name: String,
        settings: RoomSettings,
    },
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_id: RoomId,
        display_name: String,
    },
    #[serde(rename_all = "camelCase")]
    LeaveGame { room_id: RoomId },
    /// Creator only, needs at least 3 seated players
    #[serde(rename_all = "camelCase")]
    StartGame { room_id: RoomId },
    /// Honest player opens the reveal window
    #[serde(rename_all = "camelCase")]
    UseHonestButton { room_id: RoomId },
    /// Informed player moves the room into voting
    #[serde(rename_all = "camelCase")]
    StartVoting { room_id: RoomId },
    #[serde(rename_all = "camelCase")]
    Vote {
        room_id: RoomId,
        honest_guess_id: ConnectionId,
        #[serde(default)]
        deceiver_guess_id: Option<ConnectionId>,
    },
    /// Manual round rotation, idempotent with the auto-advance timer
    #[serde(rename_all = "camelCase")]
    NextGame { room_id: RoomId },
    GetRooms,
    /// Pass-through relay, no state mutation
    #[serde(rename_all = "camelCase")]
    ChatMessage {
        room_id: RoomId,
        content: String,
        sender: String,
    },
    #[serde(rename = "join-voice", rename_all = "camelCase")]
    JoinVoice {
        room_id: RoomId,
        #[serde(default)]
        peer_handle: Option<String>,
    },
    #[serde(rename = "leave-voice", rename_all = "camelCase")]
    LeaveVoice { room_id: RoomId },
    #[serde(rename = "store-peer-id", rename_all = "camelCase")]
    StorePeerId {
        room_id: RoomId,
        peer_handle: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "camelCase")]
pub enum ServerMessage {
    /// First frame on every connection
    #[serde(rename_all = "camelCase")]
    Welcome {
        connection_id: ConnectionId,
        server_now: String,
    },
    PlayerJoined { room: RoomView },
    PlayerLeft { room: RoomView },
    /// Personalized per recipient: each player sees only their own role
    GameStarted { room: RoomView, role: Role },
    NextGameStarted { room: RoomView, role: Role },
    VotingStarted { room: RoomView },
    VoteResult { room: RoomView, outcome: VoteOutcome },
    /// Personalized: `answer_ref` is present only for the honest player
    /// while the window is open
    #[serde(rename_all = "camelCase")]
    AnswerReveal {
        room: RoomView,
        showing: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        ends_at: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        answer_ref: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    RoomClosed { room_id: RoomId, reason: String },
    RoomList { rooms: Vec<RoomSummary> },
    #[serde(rename_all = "camelCase")]
    ChatMessage {
        room_id: RoomId,
        content: String,
        sender: String,
    },
    #[serde(rename = "voice-users", rename_all = "camelCase")]
    VoiceUsers {
        room_id: RoomId,
        users: Vec<VoicePeer>,
    },
    Error { code: String, msg: String },
}

/// Public view of a seated player. Roles are secret and never leave the
/// server through this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub connection_id: ConnectionId,
    pub display_name: String,
    pub score: i32,
    pub has_revealed_answer: bool,
}

impl From<&Player> for PlayerView {
    fn from(p: &Player) -> Self {
        Self {
            connection_id: p.connection_id.clone(),
            display_name: p.display_name.clone(),
            score: p.score,
            has_revealed_answer: p.has_revealed_answer,
        }
    }
}

/// Public view of a room. The answer reference is stripped from the
/// current question; the reveal window carries timing only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub id: RoomId,
    pub players: Vec<PlayerView>,
    pub settings: RoomSettings,
    pub phase: RoomPhase,
    pub current_round_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_reveal: Option<AnswerReveal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_outcome: Option<VoteOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerView>,
}

impl From<&Room> for RoomView {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.clone(),
            players: room.players.iter().map(PlayerView::from).collect(),
            settings: room.settings.clone(),
            phase: room.phase,
            current_round_index: room.current_round_index,
            prompt_ref: room.current_question.as_ref().map(|q| q.prompt_ref.clone()),
            answer_reveal: room.answer_reveal.clone(),
            vote_outcome: room.vote_outcome.clone(),
            winner: room.winner.as_ref().map(PlayerView::from),
        }
    }
}

/// One row of the lobby's room list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: RoomId,
    pub players: Vec<PlayerView>,
    pub phase: RoomPhase,
    pub settings: RoomSettings,
}

impl From<&Room> for RoomSummary {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.clone(),
            players: room.players.iter().map(PlayerView::from).collect(),
            phase: room.phase,
            settings: room.settings.clone(),
        }
    }
}
