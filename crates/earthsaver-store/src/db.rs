//! The SQLite handle behind [`crate::SqliteBlobStore`].
//!
//! One connection, shared behind a mutex. Work is shipped to tokio's blocking
//! pool so callers on the async runtime never wait on disk I/O directly.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::migration;

/// Milliseconds a writer waits on a locked database before giving up.
const BUSY_TIMEOUT_MS: i32 = 5_000;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database file at `path`. Blocks on file I/O.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening database");
        Self::configure(Connection::open(path)?)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        debug!("opening in-memory database");
        Self::configure(Connection::open_in_memory()?)
    }

    /// Open on the blocking pool, then bring the schema up to date.
    pub async fn open_and_migrate(path: impl AsRef<Path> + Send + 'static) -> StoreResult<Self> {
        let db = tokio::task::spawn_blocking(move || Self::open(path)).await??;
        db.run_migrations().await?;
        Ok(db)
    }

    pub async fn run_migrations(&self) -> StoreResult<()> {
        self.execute(migration::run_all).await
    }

    /// Run `f` with exclusive access to the connection on the blocking pool.
    ///
    /// ```ignore
    /// let rows: i64 = db
    ///     .execute(|conn| Ok(conn.query_row("SELECT count(*) FROM blob_slots", [], |r| r.get(0))?))
    ///     .await?;
    /// ```
    pub async fn execute<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|e| StoreError::TaskJoin(format!("connection mutex poisoned: {e}")))?;
            f(&guard)
        })
        .await?
    }

    /// WAL keeps the last committed snapshot readable if a write is cut short.
    fn configure(conn: Connection) -> StoreResult<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        conn.pragma_update(None, "busy_timeout", BUSY_TIMEOUT_MS)?;
        debug!("pragmas applied");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

// ── tests ────────────────────────────────────────────────────────────
