//! Key-value blob persistence.
//!
//! Account state lives in a handful of named string slots, each holding one
//! complete serialized document. Every write replaces the whole slot, so the
//! last fully written document is always the recovery point.
//!
//! [`BlobStore`] is the narrow interface the rest of the crate talks to.
//! Two backends are provided: [`MemoryBlobStore`] for tests and throwaway
//! hosts, and [`SqliteBlobStore`] on top of [`Database`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, instrument};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

// ═══════════════════════════════════════════════════════════════════════
//  Trait
// ═══════════════════════════════════════════════════════════════════════

/// String-valued slots addressed by key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read a slot, returning `None` if it has never been written or was removed.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Replace the contents of a slot.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove a slot, returning `true` if it existed.
    async fn remove(&self, key: &str) -> StoreResult<bool>;
}

// ═══════════════════════════════════════════════════════════════════════
//  MemoryBlobStore
// ═══════════════════════════════════════════════════════════════════════

/// In-process slots. Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.slots
            .lock()
            .map_err(|e| StoreError::TaskJoin(format!("mutex poisoned: {e}")))
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<bool> {
        Ok(self.lock()?.remove(key).is_some())
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  SqliteBlobStore
// ═══════════════════════════════════════════════════════════════════════

/// Slots stored as rows of the `blob_slots` table.
#[derive(Clone)]
pub struct SqliteBlobStore {
    db: Database,
}

impl SqliteBlobStore {
    /// Create a blob store backed by an already migrated `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BlobStore for SqliteBlobStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let key = key.to_string();
        self.db
            .execute(move |conn| {
                let result = conn.query_row(
                    "SELECT value FROM blob_slots WHERE key = ?1",
                    rusqlite::params![key],
                    |row| row.get(0),
                );
                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let key = key.to_string();
        let value = value.to_string();
        let now = Utc::now().timestamp();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO blob_slots (key, value, updated_at) VALUES (?1, ?2, ?3) \
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                    rusqlite::params![key, value, now],
                )?;
                debug!(key = %key, "blob slot written");
                Ok(())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> StoreResult<bool> {
        let key = key.to_string();
        self.db
            .execute(move |conn| {
                let deleted = conn.execute(
                    "DELETE FROM blob_slots WHERE key = ?1",
                    rusqlite::params![key],
                )?;
                Ok(deleted > 0)
            })
            .await
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  FailingBlobStore (tests only)
// ═══════════════════════════════════════════════════════════════════════

/// A [`MemoryBlobStore`] whose writes can be made to fail, either for every
/// slot or for one named slot. Clones share the slots and the switches.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct FailingBlobStore {
    pub inner: MemoryBlobStore,
    fail_all: Arc<std::sync::atomic::AtomicBool>,
    fail_slot: Arc<Mutex<Option<String>>>,
}

#[cfg(test)]
impl FailingBlobStore {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_all
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn fail_writes_to(&self, key: &str) {
        *self.fail_slot.lock().unwrap() = Some(key.to_string());
    }

    fn check(&self, key: &str) -> StoreResult<()> {
        let refused = self.fail_all.load(std::sync::atomic::Ordering::SeqCst)
            || self.fail_slot.lock().unwrap().as_deref() == Some(key);
        if refused {
            return Err(StoreError::InvalidArgument(format!("write to '{key}' refused")));
        }
        Ok(())
    }
}

#[cfg(test)]
#[async_trait]
impl BlobStore for FailingBlobStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.check(key)?;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> StoreResult<bool> {
        self.check(key)?;
        self.inner.remove(key).await
    }
}

// ── tests ────────────────────────────────────────────────────────────
