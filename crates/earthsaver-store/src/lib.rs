//! # earthsaver-store
//!
//! Accounts, sessions and progression for Earth Saver.
//!
//! Durable state is two JSON documents kept in named blob slots: the full
//! user map and a copy of the logged-in user. Both are rewritten whole on
//! every change.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  AuthService                                │
//! │    UserStore     (lowercase name → User)    │
//! │    SessionStore  (current user copy)        │
//! │    achievements  (rule table → sink)        │
//! ├─────────────────────────────────────────────┤
//! │  BlobStore       (get / set / remove slot)  │
//! │    MemoryBlobStore │ SqliteBlobStore        │
//! ├─────────────────────────────────────────────┤
//! │  Database (rusqlite WAL, migrations)        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use earthsaver_store::{AuthConfig, AuthService, Database, SqliteBlobStore};
//!
//! let db = Database::open_and_migrate("data/earthsaver.db").await?;
//! let mut auth = AuthService::open(Arc::new(SqliteBlobStore::new(db)), AuthConfig::default()).await?;
//! auth.register("alice", "alice@example.com", "secret1").await?;
//! auth.login("alice", "secret1").await?;
//! ```

pub mod achievements;
pub mod auth;
pub mod blob;
pub mod config;
pub mod db;
pub mod error;
pub mod migration;
pub mod password;
pub mod session;
pub mod user;
pub mod user_store;

// ── re-exports ───────────────────────────────────────────────────────

pub use achievements::{AchievementEvent, AchievementSink, NoopSink};
pub use auth::{AuthService, StatsUpdate};
pub use blob::{BlobStore, MemoryBlobStore, SqliteBlobStore};
pub use config::AuthConfig;
pub use db::Database;
pub use error::{AuthError, StoreError, StoreResult, ValidationError};
pub use password::PasswordScheme;
pub use session::SessionStore;
pub use user::{Achievement, GameResult, Stats, User};
pub use user_store::UserStore;
