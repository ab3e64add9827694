//! The logged-in user.
//!
//! A session holds a detached copy of one [`User`] record in its own blob
//! slot, separate from the user store. Logging out removes the slot.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::blob::BlobStore;
use crate::error::StoreResult;
use crate::user::User;

/// At most one current user, persisted independently of the store.
pub struct SessionStore {
    blobs: Arc<dyn BlobStore>,
    slot: String,
    current: Option<User>,
}

impl SessionStore {
    /// Restore the session from `slot`.
    ///
    /// An unreadable session document is treated as logged out rather than
    /// failing startup.
    #[instrument(skip(blobs))]
    pub async fn load(blobs: Arc<dyn BlobStore>, slot: &str) -> StoreResult<Self> {
        let current = match blobs.get(slot).await? {
            Some(doc) => match serde_json::from_str::<User>(&doc) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "discarding unreadable session");
                    None
                }
            },
            None => None,
        };
        debug!(logged_in = current.is_some(), "session loaded");
        Ok(Self {
            blobs,
            slot: slot.to_string(),
            current,
        })
    }

    pub fn current(&self) -> Option<&User> {
        self.current.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Whether `username` names the session owner, ignoring case.
    pub fn is_owner(&self, username: &str) -> bool {
        self.current
            .as_ref()
            .is_some_and(|user| user.key() == username.to_lowercase())
    }

    /// Replace the session copy and persist it.
    pub async fn set(&mut self, user: User) -> StoreResult<()> {
        let doc = serde_json::to_string(&user)?;
        self.blobs.set(&self.slot, &doc).await?;
        debug!(username = %user.username, "session saved");
        self.current = Some(user);
        Ok(())
    }

    /// End the session and remove its slot. If the slot cannot be removed
    /// the session stays active.
    pub async fn clear(&mut self) -> StoreResult<()> {
        self.blobs.remove(&self.slot).await?;
        self.current = None;
        debug!("session cleared");
        Ok(())
    }
}

// ── tests ────────────────────────────────────────────────────────────
