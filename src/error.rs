use thiserror::Error;

/// Custom error types for the coding room client
#[derive(Debug, Error)]
pub enum RoomError {
    /// Connectivity errors: gateway or judge unreachable. Non-fatal,
    /// prior session state stays intact.
    #[error("Gateway unreachable: {0}")]
    GatewayUnreachable(String),

    #[error("Judge service unreachable: {0}")]
    JudgeUnreachable(String),

    /// Judge-reported failures. All test cases for the run are marked
    /// failed; the diagnostic is reported verbatim to the user.
    #[error("Compilation error: {0}")]
    CompileError(String),

    #[error("Runtime error: {0}")]
    RuntimeError(String),

    #[error("Judge rejected submission: {0}")]
    JudgeRejected(String),

    /// Guard violations: rejected synchronously, no state mutated
    #[error("Complete the current question or wait for its timer to expire before moving on")]
    CannotAdvance,

    #[error("You cannot go back to a completed question")]
    CannotGoBack,

    #[error("All test cases must pass before submission")]
    TestsNotPassing,

    #[error("Question {0} was already submitted")]
    AlreadySubmitted(usize),

    #[error("A code run is already in progress")]
    RunInFlight,

    /// Data errors
    #[error("Room has not received its question set yet")]
    RoomNotInitialized,

    #[error("Question {0} has no usable test cases")]
    MalformedQuestion(usize),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Failed to serialize message: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// Generic errors
    #[error("Internal client error: {0}")]
    Internal(String),
}

/// Convenience type alias for Results using RoomError
pub type Result<T> = std::result::Result<T, RoomError>;

impl RoomError {
    /// Helper to create Internal errors with context
    pub fn internal(msg: impl Into<String>) -> Self {
        RoomError::Internal(msg.into())
    }

    /// True for errors surfaced as a non-fatal banner rather than a
    /// failed operation
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            RoomError::GatewayUnreachable(_) | RoomError::JudgeUnreachable(_)
        )
    }

    /// True for navigation/submission guard rejections
    pub fn is_guard_violation(&self) -> bool {
        matches!(
            self,
            RoomError::CannotAdvance
                | RoomError::CannotGoBack
                | RoomError::TestsNotPassing
                | RoomError::AlreadySubmitted(_)
                | RoomError::RunInFlight
        )
    }
}

impl From<reqwest::Error> for RoomError {
    fn from(err: reqwest::Error) -> Self {
        RoomError::JudgeUnreachable(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for RoomError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        RoomError::GatewayUnreachable(err.to_string())
    }
}
