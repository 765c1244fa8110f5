use serde::Serialize;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    #[error("At least 3 players are required to start, got {count}")]
    InsufficientPlayers { count: usize },

    #[error("Room {0} not found")]
    RoomNotFound(String),

    #[error("Player {0} not found")]
    PlayerNotFound(String),

    #[error("Service unreachable: {0}")]
    NetworkUnavailable(String),

    #[error("Assistant request failed: {0}")]
    GenerativeService(String),

    #[error("Room {0} is not accepting players")]
    RoomClosed(String),

    #[error("Room {0} is full")]
    RoomFull(String),

    #[error("A game is already running in room {0}")]
    GameInProgress(String),

    #[error("Game has not started in room {0}")]
    GameNotStarted(String),

    #[error("Session token is invalid or expired")]
    InvalidSession,

    #[error("A meeting is already in progress")]
    MeetingInProgress,

    #[error("No meeting is accepting votes")]
    MeetingNotActive,

    #[error("Vote was cast for meeting round {actual}, current round is {expected}")]
    StaleMeeting { expected: u64, actual: u64 },

    #[error("Candidate {0} cannot be voted for")]
    InvalidCandidate(String),

    #[error("Player {0} is not allowed to do that right now")]
    NotEligible(String),

    #[error("Only the room host can do that, {0} is not the host")]
    NotArbiter(String),

    #[error("Only the imposter can sabotage, {0} is not the imposter")]
    NotImposter(String),

    #[error("Sabotage is cooling down for another {remaining_ms}ms")]
    SabotageCooldown { remaining_ms: i64 },

    #[error("File {0} not found")]
    FileNotFound(String),

    #[error("Terminal for file {0} is locked")]
    TerminalLocked(String),

    #[error("Line {0} is outside the file")]
    InvalidLine(u32),

    #[error("Missing {0} for this sabotage")]
    MissingTarget(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Serialize for GameError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GameError>;
