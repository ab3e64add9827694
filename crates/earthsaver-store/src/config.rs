//! Account store settings.

use serde::{Deserialize, Serialize};

use crate::password::PasswordScheme;

/// Tunables for [`crate::AuthService`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Slot holding the lowercase-username → user document.
    pub users_slot: String,
    /// Slot holding the logged-in user's copy.
    pub current_user_slot: String,
    /// Format used for newly written password hashes.
    pub password_scheme: PasswordScheme,
    pub min_username_len: usize,
    pub min_password_len: usize,
    pub leaderboard_size: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            users_slot: "users".into(),
            current_user_slot: "currentUser".into(),
            password_scheme: PasswordScheme::default(),
            min_username_len: 3,
            min_password_len: 6,
            leaderboard_size: 10,
        }
    }
}

impl AuthConfig {
    /// Defaults with the legacy hash, readable by older stored documents.
    pub fn legacy() -> Self {
        Self {
            password_scheme: PasswordScheme::Legacy,
            ..Self::default()
        }
    }
}
