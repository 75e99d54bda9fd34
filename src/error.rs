/// Result type for coordinator operations
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Errors surfaced to clients. Every variant is local to the triggering
/// request or timer; none is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("room {0} not found")]
    RoomNotFound(String),

    #[error("room {0} is full")]
    RoomFull(String),

    #[error("game in room {0} has already started")]
    GameAlreadyStarted(String),

    #[error("{0}")]
    InvalidRoleAction(String),

    #[error("room was closed: {reason}")]
    RoomClosed { reason: String },

    #[error("invalid room settings: {0}")]
    InvalidSettings(String),

    #[error("question source unavailable: {0}")]
    QuestionSource(#[from] QuestionError),
}

impl CoordinatorError {
    /// Stable wire code for the client, independent of the display text.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RoomNotFound(_) => "ROOM_NOT_FOUND",
            Self::RoomFull(_) => "ROOM_FULL",
            Self::GameAlreadyStarted(_) => "GAME_ALREADY_STARTED",
            Self::InvalidRoleAction(_) => "INVALID_ROLE_ACTION",
            Self::RoomClosed { .. } => "ROOM_CLOSED",
            Self::InvalidSettings(_) => "INVALID_SETTINGS",
            Self::QuestionSource(_) => "QUESTION_SOURCE",
        }
    }
}

/// Errors from the external question asset collaborator
#[derive(Debug, thiserror::Error)]
pub enum QuestionError {
    #[error("failed to scan question assets: {0}")]
    Io(#[from] std::io::Error),

    #[error("no questions available under {0}")]
    Empty(String),
}
