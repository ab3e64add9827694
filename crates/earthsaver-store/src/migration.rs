//! Versioned schema migrations.
//!
//! The applied version lives in SQLite's `user_version` header field. Each
//! step runs in its own transaction together with the version bump, so a
//! failed step leaves the schema at the previous version.

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

struct Step {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

/// Append new steps at the end with the next version number.
static STEPS: &[Step] = &[Step {
    version: 1,
    description: "blob slots, one serialized document per key",
    sql: "CREATE TABLE blob_slots (
              key        TEXT PRIMARY KEY,
              value      TEXT NOT NULL,
              updated_at INTEGER NOT NULL
          );",
}];

/// Bring the schema up to the newest step.
pub fn run_all(conn: &Connection) -> StoreResult<()> {
    let from = current_version(conn)?;
    let mut applied = 0;
    for step in STEPS.iter().filter(|s| s.version > from) {
        apply(conn, step)?;
        applied += 1;
    }

    if applied == 0 {
        debug!(version = from, "schema up to date");
    } else {
        info!(from, to = current_version(conn)?, applied, "schema migrated");
    }
    Ok(())
}

/// The last applied step, 0 for a fresh database.
pub fn current_version(conn: &Connection) -> StoreResult<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| failed(0, "read schema version", e))
}

fn apply(conn: &Connection, step: &Step) -> StoreResult<()> {
    debug!(version = step.version, description = step.description, "applying migration");

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| failed(step.version, "begin", e))?;
    let outcome = tx
        .execute_batch(step.sql)
        .and_then(|()| tx.pragma_update(None, "user_version", step.version));

    match outcome {
        Ok(()) => tx.commit().map_err(|e| failed(step.version, "commit", e)),
        Err(e) => {
            warn!(version = step.version, error = %e, "migration failed, rolled back");
            // Dropping the transaction rolls it back.
            Err(failed(step.version, "apply", e))
        }
    }
}

fn failed(version: u32, stage: &str, e: rusqlite::Error) -> StoreError {
    StoreError::Migration {
        version,
        message: format!("{stage}: {e}"),
    }
}

// ── tests ────────────────────────────────────────────────────────────
