//! Error types for the earthsaver-quiz crate.

use thiserror::Error;

/// Alias for `Result<T, QuizError>`.
pub type QuizResult<T> = Result<T, QuizError>;

/// Errors raised while loading a question bank.
#[derive(Debug, Error)]
pub enum QuizError {
    /// The bank file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The bank is not valid JSON or does not match the question schema.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A question failed validation.
    #[error("question {index} is invalid: {reason}")]
    InvalidQuestion { index: usize, reason: String },

    /// A quiz needs at least one question.
    #[error("question bank is empty")]
    EmptyBank,
}
