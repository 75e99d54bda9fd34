use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque ID types for type safety
pub type RoomId = String;
pub type ConnectionId = String;
pub type QuestionId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoomPhase {
    Waiting,
    Playing,
    Voting,
    Ended,
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Informed,
    Honest,
    Deceiver,
}

/// Per-room gameplay settings, validated on room creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettings {
    pub max_players: usize,
    pub total_rounds: u32,
    pub points_to_win: i32,
    pub answer_view_seconds: u64,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            max_players: 8,
            total_rounds: 5,
            points_to_win: 10,
            answer_view_seconds: 10,
        }
    }
}

/// A seated player. `display_name` is the stable identity across
/// reconnects; `connection_id` is re-bound on every reconnect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub connection_id: ConnectionId,
    pub display_name: String,
    pub role: Option<Role>,
    pub score: i32,
    pub has_revealed_answer: bool,
}

impl Player {
    pub fn new(connection_id: ConnectionId, display_name: String) -> Self {
        Self {
            connection_id,
            display_name,
            role: None,
            score: 0,
            has_revealed_answer: false,
        }
    }
}

/// Opaque references into the external asset collaborator. The
/// coordinator only selects and distributes them, never reads content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub prompt_ref: String,
    pub answer_ref: String,
}

/// Reveal window state. `ends_at` is when the hide timer flips
/// `showing` back off.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerReveal {
    pub showing: bool,
    pub ends_at: String,
}

/// Result of the informed player's guess, created once per round at the
/// vote transition and cleared on round rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    pub informed_connection_id: ConnectionId,
    pub honest_guess_id: ConnectionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deceiver_guess_id: Option<ConnectionId>,
    pub honest_guess_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deceiver_guess_correct: Option<bool>,
    pub score_deltas: HashMap<ConnectionId, i32>,
    pub is_game_over: bool,
}

#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    /// Seat 0 is the creator; losing that seat closes the room.
    pub players: Vec<Player>,
    pub settings: RoomSettings,
    pub phase: RoomPhase,
    pub current_round_index: u32,
    pub current_question: Option<Question>,
    pub answer_reveal: Option<AnswerReveal>,
    pub vote_outcome: Option<VoteOutcome>,
    pub winner: Option<Player>,
    /// Advances +1 mod players.len() each round for rotation fairness.
    pub current_informed_slot: usize,
}

impl Room {
    pub fn new(id: RoomId, settings: RoomSettings) -> Self {
        Self {
            id,
            players: Vec::new(),
            settings,
            phase: RoomPhase::Waiting,
            current_round_index: 0,
            current_question: None,
            answer_reveal: None,
            vote_outcome: None,
            winner: None,
            current_informed_slot: 0,
        }
    }

    /// Creator-ness is derived from seat 0, never stored separately.
    pub fn is_creator(&self, connection_id: &str) -> bool {
        self.players
            .first()
            .map(|p| p.connection_id == connection_id)
            .unwrap_or(false)
    }

    pub fn player_by_connection(&self, connection_id: &str) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.connection_id == connection_id)
    }

    pub fn player_by_name(&self, display_name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.display_name == display_name)
    }

    pub fn player_with_role(&self, role: Role) -> Option<&Player> {
        self.players.iter().find(|p| p.role == Some(role))
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.settings.max_players
    }

    /// Whether the answer is visible right now (reveal window open).
    pub fn reveal_showing(&self) -> bool {
        self.answer_reveal
            .as_ref()
            .map(|r| r.showing)
            .unwrap_or(false)
    }
}

/// Live-connection binding used to re-attach a reconnecting player to
/// their seat, and to resolve transport-level disconnects to a room.
#[derive(Debug, Clone)]
pub struct Session {
    pub connection_id: ConnectionId,
    pub room_id: RoomId,
    pub display_name: String,
}

/// Tombstone kept after closure so late-arriving clients learn why the
/// room vanished instead of getting a bare not-found.
#[derive(Debug, Clone)]
pub struct ClosedRoomRecord {
    pub room_id: RoomId,
    pub reason: String,
    pub closed_at: chrono::DateTime<chrono::Utc>,
}

/// A participant in a room's audio sub-channel. The peer handle is an
/// opaque signaling token; the coordinator stores and relays it only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoicePeer {
    pub connection_id: ConnectionId,
    pub peer_handle: String,
}
