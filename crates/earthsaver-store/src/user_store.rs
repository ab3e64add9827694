//! Account records keyed by lowercase username.
//!
//! The whole mapping is one JSON document in a single blob slot. It is
//! read once by [`UserStore::load`] and rewritten in full on every mutation.
//! A mutation is applied to a copy of the map, the copy is written, and only
//! then does it replace the in-memory map, so a failed write leaves the
//! store exactly as it was. The last writer wins.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::blob::BlobStore;
use crate::config::AuthConfig;
use crate::error::{AuthError, StoreResult, ValidationError};
use crate::password;
use crate::user::User;

/// In-memory snapshot of every account plus the slot it persists to.
pub struct UserStore {
    blobs: Arc<dyn BlobStore>,
    slot: String,
    users: BTreeMap<String, User>,
}

impl UserStore {
    /// Read the snapshot from `slot`, starting empty if the slot is unset.
    #[instrument(skip(blobs))]
    pub async fn load(blobs: Arc<dyn BlobStore>, slot: &str) -> StoreResult<Self> {
        let users = match blobs.get(slot).await? {
            Some(doc) => serde_json::from_str(&doc)?,
            None => BTreeMap::new(),
        };
        info!(count = users.len(), "user store loaded");
        Ok(Self {
            blobs,
            slot: slot.to_string(),
            users,
        })
    }

    /// Write `next` to the slot and adopt it once the write succeeded.
    async fn commit(&mut self, next: BTreeMap<String, User>) -> StoreResult<()> {
        let doc = serde_json::to_string(&next)?;
        self.blobs.set(&self.slot, &doc).await?;
        self.users = next;
        debug!(count = self.users.len(), "user store persisted");
        Ok(())
    }

    /// Case-insensitive lookup.
    pub fn get(&self, username: &str) -> Option<&User> {
        self.users.get(&username.to_lowercase())
    }

    /// The account registered with `email`, compared case-insensitively.
    pub fn find_by_email(&self, email: &str) -> Option<&User> {
        let email = email.to_lowercase();
        self.users
            .values()
            .find(|user| user.email.to_lowercase() == email)
    }

    /// All accounts in key order.
    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Insert or replace a record under its lowercase username and persist.
    pub async fn save(&mut self, user: User) -> StoreResult<()> {
        let mut next = self.users.clone();
        next.insert(user.key(), user);
        self.commit(next).await
    }

    /// Drop a record and persist. Returns the removed record, if any.
    pub async fn delete(&mut self, username: &str) -> StoreResult<Option<User>> {
        let mut next = self.users.clone();
        let removed = next.remove(&username.to_lowercase());
        if removed.is_some() {
            self.commit(next).await?;
        }
        Ok(removed)
    }

    /// Validate input, create the account and persist the store.
    #[instrument(skip(self, password, config))]
    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
        config: &AuthConfig,
    ) -> StoreResult<User> {
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(ValidationError::MissingFields.into());
        }
        if text_len(username) < config.min_username_len {
            return Err(ValidationError::UsernameTooShort {
                min: config.min_username_len,
            }
            .into());
        }
        if text_len(password) < config.min_password_len {
            return Err(ValidationError::PasswordTooShort {
                min: config.min_password_len,
            }
            .into());
        }
        if self.get(username).is_some() {
            return Err(ValidationError::DuplicateUsername.into());
        }
        if self.find_by_email(email).is_some() {
            return Err(ValidationError::DuplicateEmail.into());
        }

        let hash = config.password_scheme.hash_blocking(password).await?;
        let user = User::new(username, email, hash);
        self.save(user.clone()).await?;

        info!(username = %user.username, "user registered");
        Ok(user)
    }

    /// Check credentials and return the stored record.
    ///
    /// An unknown username and a wrong password produce the same error.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> StoreResult<&User> {
        if username.is_empty() || password.is_empty() {
            return Err(ValidationError::MissingCredentials.into());
        }
        let user = self.get(username).ok_or(AuthError::InvalidCredentials)?;
        if !password::verify_blocking(password, &user.password_hash).await? {
            debug!("password mismatch");
            return Err(AuthError::InvalidCredentials.into());
        }
        Ok(user)
    }
}

/// Length as the browser counts it, in UTF-16 code units.
fn text_len(s: &str) -> usize {
    s.encode_utf16().count()
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::{FailingBlobStore, MemoryBlobStore};
    use crate::error::StoreError;
    use crate::password::PasswordScheme;

    async fn setup_store() -> (UserStore, MemoryBlobStore) {
        let blobs = MemoryBlobStore::new();
        let store = UserStore::load(Arc::new(blobs.clone()), "users")
            .await
            .unwrap();
        (store, blobs)
    }

    fn config() -> AuthConfig {
        AuthConfig::legacy()
    }

    fn expect_validation(result: StoreResult<User>, expected: ValidationError) {
        match result {
            Err(StoreError::Validation(err)) => assert_eq!(err, expected),
            other => panic!("expected {expected:?}, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn register_creates_fresh_account_and_persists() {
        let (mut store, blobs) = setup_store().await;

        let user = store
            .register("Alice", "alice@example.com", "secret1", &config())
            .await
            .unwrap();

        assert_eq!(user.username, "Alice");
        assert_eq!(user.level, 1);
        assert_eq!(user.experience, 0);
        assert!(user.achievements.is_empty());
        assert_eq!(user.stats, Default::default());

        let doc = blobs.get("users").await.unwrap().unwrap();
        let saved: serde_json::Value = serde_json::from_str(&doc).unwrap();
        assert_eq!(saved["alice"]["username"], "Alice");
    }

    #[tokio::test]
    async fn register_rejects_bad_input() {
        let (mut store, _) = setup_store().await;
        let cfg = config();

        expect_validation(
            store.register("", "a@example.com", "secret1", &cfg).await,
            ValidationError::MissingFields,
        );
        expect_validation(
            store.register("bob", "", "secret1", &cfg).await,
            ValidationError::MissingFields,
        );
        expect_validation(
            store.register("al", "a@example.com", "secret1", &cfg).await,
            ValidationError::UsernameTooShort { min: 3 },
        );
        expect_validation(
            store.register("alice", "a@example.com", "12345", &cfg).await,
            ValidationError::PasswordTooShort { min: 6 },
        );
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn register_rejects_case_insensitive_duplicates() {
        let (mut store, _) = setup_store().await;
        let cfg = config();
        store
            .register("alice", "alice@example.com", "secret1", &cfg)
            .await
            .unwrap();

        expect_validation(
            store.register("ALICE", "other@example.com", "secret1", &cfg).await,
            ValidationError::DuplicateUsername,
        );
        expect_validation(
            store.register("bob", "Alice@Example.COM", "secret1", &cfg).await,
            ValidationError::DuplicateEmail,
        );
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn authenticate_hides_which_check_failed() {
        let (mut store, _) = setup_store().await;
        store
            .register("alice", "alice@example.com", "secret1", &config())
            .await
            .unwrap();

        let wrong_password = store.authenticate("alice", "wrong-pw").await.unwrap_err();
        let unknown_user = store.authenticate("nobody", "secret1").await.unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert!(matches!(
            wrong_password,
            StoreError::Auth(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            unknown_user,
            StoreError::Auth(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn authenticate_is_case_insensitive_on_username() {
        let (mut store, _) = setup_store().await;
        store
            .register("Alice", "alice@example.com", "secret1", &config())
            .await
            .unwrap();

        let user = store.authenticate("aLiCe", "secret1").await.unwrap();
        assert_eq!(user.username, "Alice");
    }

    #[tokio::test]
    async fn authenticate_requires_both_fields() {
        let (store, _) = setup_store().await;
        assert!(matches!(
            store.authenticate("", "secret1").await,
            Err(StoreError::Validation(ValidationError::MissingCredentials))
        ));
    }

    #[tokio::test]
    async fn failed_write_leaves_store_unchanged() {
        let blobs = FailingBlobStore::default();
        let mut store = UserStore::load(Arc::new(blobs.clone()), "users")
            .await
            .unwrap();
        let cfg = config();
        let alice = store
            .register("alice", "alice@example.com", "secret1", &cfg)
            .await
            .unwrap();
        let saved = blobs.get("users").await.unwrap();

        blobs.fail_writes(true);
        let err = store
            .register("bob", "bob@example.com", "secret2", &cfg)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
        assert!(store.get("bob").is_none());

        let mut updated = alice.clone();
        updated.experience = 500;
        assert!(store.save(updated).await.is_err());
        assert_eq!(store.get("alice").unwrap().experience, 0);

        assert!(store.delete("alice").await.is_err());
        assert!(store.get("alice").is_some());

        assert_eq!(store.len(), 1);
        assert_eq!(blobs.get("users").await.unwrap(), saved);

        // Once writes work again the same registration goes through.
        blobs.fail_writes(false);
        store
            .register("bob", "bob@example.com", "secret2", &cfg)
            .await
            .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn delete_of_unknown_user_writes_nothing() {
        let blobs = FailingBlobStore::default();
        let mut store = UserStore::load(Arc::new(blobs.clone()), "users")
            .await
            .unwrap();
        blobs.fail_writes(true);

        assert_eq!(store.delete("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn pbkdf2_accounts_register_and_authenticate() {
        let (mut store, _) = setup_store().await;
        let cfg = AuthConfig {
            password_scheme: PasswordScheme::Pbkdf2 { iterations: 1_000 },
            ..config()
        };
        let user = store
            .register("alice", "alice@example.com", "secret1", &cfg)
            .await
            .unwrap();
        assert!(user.password_hash.starts_with("pbkdf2-sha256$1000$"));

        assert!(store.authenticate("alice", "secret1").await.is_ok());
        assert!(matches!(
            store.authenticate("alice", "secret2").await,
            Err(StoreError::Auth(AuthError::InvalidCredentials))
        ));
    }

    #[tokio::test]
    async fn load_reads_existing_snapshot() {
        let (mut store, blobs) = setup_store().await;
        store
            .register("alice", "alice@example.com", "secret1", &config())
            .await
            .unwrap();

        let reloaded = UserStore::load(Arc::new(blobs), "users").await.unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.get("ALICE").is_some());
    }

    #[tokio::test]
    async fn load_rejects_corrupt_snapshot() {
        let blobs = MemoryBlobStore::new();
        blobs.set("users", "not json").await.unwrap();

        let result = UserStore::load(Arc::new(blobs), "users").await;
        assert!(matches!(result, Err(StoreError::Json(_))));
    }
}
