//! Match engine error taxonomy

/// Errors surfaced by room operations. All are local to one request and
/// leave the store untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PongError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("Room not found or expired")]
    NotFound,

    #[error("You are not a player in this room")]
    Forbidden,

    #[error("Room is full")]
    RoomFull,

    #[error("Second player required")]
    NeedSecondPlayer,
}

impl PongError {
    /// Stable machine-readable code for API clients
    pub fn code(&self) -> &'static str {
        match self {
            PongError::InvalidArgument(_) => "invalid_argument",
            PongError::NotFound => "not_found",
            PongError::Forbidden => "forbidden",
            PongError::RoomFull => "room_full",
            PongError::NeedSecondPlayer => "need_second_player",
        }
    }
}
