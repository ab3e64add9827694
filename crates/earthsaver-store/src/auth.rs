//! Account lifecycle, session and progression in one service.
//!
//! [`AuthService`] is constructed explicitly by whatever hosts the game and
//! passed around by reference. It owns the [`UserStore`] and the
//! [`SessionStore`], and after every completed round it folds the result
//! into the current user, awards experience and levels, evaluates
//! achievements, and persists both the store and the session copy.
//!
//! Operations that write both slots write the store first. If the session
//! write then fails, the store record is put back so the two never disagree,
//! and the error is returned.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::achievements::{self, AchievementEvent, AchievementSink, NoopSink};
use crate::blob::BlobStore;
use crate::config::AuthConfig;
use crate::error::{AuthError, StoreResult};
use crate::password;
use crate::session::SessionStore;
use crate::user::{Achievement, GameResult, User, level_for};
use crate::user_store::UserStore;

/// What a stats update changed, for the host to display.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsUpdate {
    pub experience_gained: u64,
    /// The new level if the round caused a level-up.
    pub new_level: Option<u32>,
    /// Achievements unlocked by this round, in unlock order.
    pub unlocked: Vec<Achievement>,
}

/// User store plus session manager.
pub struct AuthService {
    config: AuthConfig,
    users: UserStore,
    session: SessionStore,
    sink: Arc<dyn AchievementSink>,
}

impl AuthService {
    /// Load the store and any saved session from `blobs`.
    pub async fn open(blobs: Arc<dyn BlobStore>, config: AuthConfig) -> StoreResult<Self> {
        let users = UserStore::load(Arc::clone(&blobs), &config.users_slot).await?;
        let session = SessionStore::load(blobs, &config.current_user_slot).await?;
        Ok(Self {
            config,
            users,
            session,
            sink: Arc::new(NoopSink),
        })
    }

    /// Route achievement notifications to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn AchievementSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn users(&self) -> &UserStore {
        &self.users
    }

    // ── accounts ─────────────────────────────────────────────────────

    /// Create an account. Does not log in.
    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> StoreResult<User> {
        self.users
            .register(username, email, password, &self.config)
            .await
    }

    /// Check credentials and make the account the current session.
    ///
    /// A legacy hash is rewritten with PBKDF2 when that scheme is configured.
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, username: &str, password: &str) -> StoreResult<User> {
        let mut user = self.users.authenticate(username, password).await?.clone();

        let scheme = self.config.password_scheme;
        if scheme.needs_rehash(&user.password_hash) {
            user.password_hash = scheme.hash_blocking(password).await?;
            self.users.save(user.clone()).await?;
            info!(username = %user.username, ?scheme, "password hash upgraded");
        }

        self.session.set(user.clone()).await?;
        info!(username = %user.username, "logged in");
        Ok(user)
    }

    /// End the current session, if any.
    pub async fn logout(&mut self) -> StoreResult<()> {
        if let Some(user) = self.session.current() {
            info!(username = %user.username, "logged out");
        }
        self.session.clear().await
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_active()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.current()
    }

    /// Remove the logged-in user's account after re-checking the password,
    /// then log out. On any failure the store and session are left untouched.
    #[instrument(skip(self, password))]
    pub async fn delete_account(&mut self, username: &str, password: &str) -> StoreResult<()> {
        let Some(current) = self.session.current() else {
            return Err(AuthError::NotAuthorized.into());
        };
        if !self.session.is_owner(username) {
            return Err(AuthError::NotAuthorized.into());
        }
        let stored = current.password_hash.clone();
        if !password::verify_blocking(password, &stored).await? {
            return Err(AuthError::InvalidPassword.into());
        }

        let removed = self.users.delete(username).await?;
        if let Err(e) = self.session.clear().await {
            self.restore(username, removed).await;
            return Err(e);
        }
        info!(username = %username, "account deleted and logged out");
        Ok(())
    }

    // ── progression ──────────────────────────────────────────────────

    /// Fold a completed round into the current user.
    ///
    /// Returns `None` without touching anything when nobody is logged in.
    /// The sink hears about new achievements only after both slots are
    /// written.
    #[instrument(skip(self))]
    pub async fn update_user_stats(
        &mut self,
        result: &GameResult,
    ) -> StoreResult<Option<StatsUpdate>> {
        let Some(current) = self.session.current() else {
            debug!("no session, stats not recorded");
            return Ok(None);
        };
        let mut user = current.clone();
        let previous = self.users.get(&user.username).cloned();
        let before = user.achievements.len();

        user.stats.record(result);

        let experience_gained = result.experience();
        user.experience += experience_gained;

        let level = level_for(user.experience);
        let new_level = if level > user.level {
            user.level = level;
            info!(username = %user.username, level, "level up");
            achievements::evaluate(&mut user, AchievementEvent::LevelUp(level), &NoopSink);
            Some(level)
        } else {
            None
        };

        achievements::evaluate(&mut user, AchievementEvent::GameComplete(result), &NoopSink);

        let unlocked = user.achievements[before..].to_vec();
        let key = user.key();

        self.users.save(user.clone()).await?;
        if let Err(e) = self.session.set(user).await {
            self.restore(&key, previous).await;
            return Err(e);
        }
        for achievement in &unlocked {
            self.sink.achievement_unlocked(achievement);
        }

        Ok(Some(StatsUpdate {
            experience_gained,
            new_level,
            unlocked,
        }))
    }

    /// Put the store record for `username` back to `previous` after a failed
    /// session write. A failure here is logged, the original error wins.
    async fn restore(&mut self, username: &str, previous: Option<User>) {
        let outcome = match previous {
            Some(user) => self.users.save(user).await,
            None => self.users.delete(username).await.map(|_| ()),
        };
        if let Err(e) = outcome {
            warn!(username = %username, error = %e, "could not roll back user store");
        }
    }

    /// Top players by best score.
    ///
    /// Only users who finished at least one game are ranked. Ties are broken
    /// by lowercase username so the order is reproducible.
    pub fn leaderboard(&self) -> Vec<&User> {
        let mut ranked: Vec<&User> = self
            .users
            .iter()
            .filter(|user| user.stats.games_played > 0)
            .collect();
        ranked.sort_by(|a, b| {
            b.stats
                .best_score
                .cmp(&a.stats.best_score)
                .then_with(|| a.key().cmp(&b.key()))
        });
        ranked.truncate(self.config.leaderboard_size);
        ranked
    }
}

// ── tests ────────────────────────────────────────────────────────────
