use thiserror::Error;

/// Custom error types for the quiz server
#[derive(Debug, Error)]
pub enum QuizError {
    /// Room lifecycle errors
    #[error("Room code space exhausted after {0} attempts")]
    CollisionExhausted(u32),

    #[error("Room {0} not found")]
    RoomNotFound(String),

    #[error("Room {0} needs exactly two players to start a game")]
    RoomNotReady(String),

    /// Signaling errors
    #[error("Failed to serialize message: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// Generic errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Convenience type alias for Results using QuizError
pub type Result<T> = std::result::Result<T, QuizError>;

impl QuizError {
    /// Helper to create Internal errors with context
    #[allow(dead_code)]
    pub fn internal(msg: impl Into<String>) -> Self {
        QuizError::Internal(msg.into())
    }
}
