//! Error types for the earthsaver-store crate.
//!
//! All account and persistence operations return [`StoreError`] via
//! [`StoreResult`]. Input problems and credential problems get their own
//! enums so callers can match on the exact failure without parsing
//! messages.

use thiserror::Error;

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the account store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Registration or login input was malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Credentials were rejected or the caller is not allowed to act.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// SQLite operation failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A schema migration failed.
    #[error("migration v{version} failed: {message}")]
    Migration { version: u32, message: String },

    /// A stored value could not be interpreted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A blocking task was cancelled or panicked.
    #[error("background task failed: {0}")]
    TaskJoin(String),
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskJoin(err.to_string())
    }
}

/// Rejected registration or login input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("All fields are required")]
    MissingFields,

    #[error("Username and password are required")]
    MissingCredentials,

    #[error("Username must be at least {min} characters")]
    UsernameTooShort { min: usize },

    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Email already registered")]
    DuplicateEmail,
}

/// Rejected credentials or an unauthorized account operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Covers both an unknown username and a wrong password.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The caller is not the logged-in owner of the account.
    #[error("Not authorized")]
    NotAuthorized,

    /// Re-authentication for a sensitive operation failed.
    #[error("Invalid password")]
    InvalidPassword,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_user_facing() {
        let err: StoreError = ValidationError::UsernameTooShort { min: 3 }.into();
        assert_eq!(err.to_string(), "Username must be at least 3 characters");

        let err: StoreError = ValidationError::DuplicateEmail.into();
        assert_eq!(err.to_string(), "Email already registered");
    }

    #[test]
    fn auth_errors_do_not_reveal_which_check_failed() {
        let err: StoreError = AuthError::InvalidCredentials.into();
        assert_eq!(err.to_string(), "Invalid username or password");
    }
}
