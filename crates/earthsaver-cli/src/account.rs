//! Account subcommands: register, login, logout, profile, leaderboard and
//! account deletion.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};
use tracing::info;

use earthsaver_store::user::XP_PER_LEVEL;
use earthsaver_store::{AuthService, User};

use crate::helpers::{confirm, prompt};

// ---------------------------------------------------------------------------
// Register / login / logout
// ---------------------------------------------------------------------------

pub async fn cmd_register(
    auth: &mut AuthService,
    username: &str,
    email: &str,
    stdin: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<()> {
    let password = prompt(stdin, out, "Password")?;
    let confirmation = prompt(stdin, out, "Confirm password")?;
    if password != confirmation {
        bail!("Passwords do not match");
    }

    auth.register(username, email, &password)
        .await
        .context("Registration failed")?;
    let user = auth
        .login(username, &password)
        .await
        .context("Registration succeeded but login failed")?;

    info!(username = %user.username, "registered via cli");
    writeln!(out)?;
    writeln!(out, "  Welcome to Earth Saver, {}!", user.username)?;
    writeln!(out, "  Run `earthsaver play` to start your first round.")?;
    Ok(())
}

pub async fn cmd_login(
    auth: &mut AuthService,
    username: &str,
    stdin: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<()> {
    let password = prompt(stdin, out, "Password")?;
    let user = auth
        .login(username, &password)
        .await
        .context("Login failed")?;

    writeln!(out)?;
    writeln!(
        out,
        "  Welcome back, {}! Level {} with {} XP.",
        user.username, user.level, user.experience
    )?;
    Ok(())
}

pub async fn cmd_logout(auth: &mut AuthService, out: &mut dyn Write) -> Result<()> {
    let Some(username) = auth.current_user().map(|u| u.username.clone()) else {
        writeln!(out, "  Not logged in.")?;
        return Ok(());
    };
    auth.logout().await.context("failed to end session")?;
    writeln!(out, "  Goodbye, {username}.")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

pub fn cmd_profile(auth: &AuthService, out: &mut dyn Write) -> Result<()> {
    let Some(user) = auth.current_user() else {
        bail!("Not logged in. Run `earthsaver login <username>` first.");
    };
    write_profile(user, out)
}

fn write_profile(user: &User, out: &mut dyn Write) -> Result<()> {
    let stats = &user.stats;
    let accuracy = if stats.questions_answered == 0 {
        0.0
    } else {
        stats.correct_answers as f64 * 100.0 / stats.questions_answered as f64
    };

    let heading = format!("{} <{}>", user.username, user.email);
    writeln!(out)?;
    writeln!(out, "  {heading}")?;
    writeln!(out, "  {}", "=".repeat(heading.chars().count()))?;
    writeln!(out)?;
    writeln!(
        out,
        "  Level {}  ({} / {} XP to next level)",
        user.level,
        user.experience % XP_PER_LEVEL,
        XP_PER_LEVEL
    )?;
    writeln!(out, "  Member since:     {}", user.created_at.format("%Y-%m-%d"))?;
    writeln!(out)?;
    writeln!(out, "  Games played:     {}", stats.games_played)?;
    writeln!(out, "  Total score:      {}", stats.total_score)?;
    writeln!(out, "  Best score:       {}", stats.best_score)?;
    writeln!(
        out,
        "  Correct answers:  {} / {} ({accuracy:.0}%)",
        stats.correct_answers, stats.questions_answered
    )?;
    writeln!(out, "  Best streak:      {}", stats.best_streak)?;
    writeln!(out, "  Earth saved:      {} times", stats.earth_saved)?;
    writeln!(out)?;

    if user.achievements.is_empty() {
        writeln!(out, "  No achievements yet.")?;
    } else {
        writeln!(out, "  Achievements:")?;
        for a in &user.achievements {
            writeln!(
                out,
                "    {} {:<18} {}  ({})",
                a.icon,
                a.name,
                a.description,
                a.unlocked_at.format("%Y-%m-%d")
            )?;
        }
    }
    writeln!(out)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

pub fn cmd_leaderboard(auth: &AuthService, out: &mut dyn Write) -> Result<()> {
    let board = auth.leaderboard();

    writeln!(out)?;
    writeln!(out, "  Leaderboard")?;
    writeln!(out, "  ===========")?;
    writeln!(out)?;

    if board.is_empty() {
        writeln!(out, "  No games played yet.")?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(
        out,
        "  {:>4}  {:<20} {:>10} {:>6} {:>6}",
        "#", "Player", "Best", "Level", "Games"
    )?;
    for (rank, user) in board.iter().enumerate() {
        writeln!(
            out,
            "  {:>4}  {:<20} {:>10} {:>6} {:>6}",
            rank + 1,
            user.username,
            user.stats.best_score,
            user.level,
            user.stats.games_played
        )?;
    }
    writeln!(out)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Delete account
// ---------------------------------------------------------------------------

pub async fn cmd_delete_account(
    auth: &mut AuthService,
    username: Option<&str>,
    stdin: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<()> {
    let target = match (username, auth.current_user()) {
        (Some(name), _) => name.to_owned(),
        (None, Some(user)) => user.username.clone(),
        (None, None) => bail!("Not logged in. Run `earthsaver login <username>` first."),
    };

    writeln!(out, "  This permanently deletes '{target}' and all its progress.")?;
    if !confirm(stdin, out, "Continue?")? {
        writeln!(out, "  Cancelled.")?;
        return Ok(());
    }

    let password = prompt(stdin, out, "Password")?;
    auth.delete_account(&target, &password)
        .await
        .context("Account deletion failed")?;

    writeln!(out, "  Account '{target}' deleted.")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use earthsaver_store::{AuthConfig, GameResult, MemoryBlobStore};

    use super::*;

    async fn service() -> AuthService {
        AuthService::open(Arc::new(MemoryBlobStore::new()), AuthConfig::legacy())
            .await
            .unwrap()
    }

    fn text(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn register_logs_in() {
        let mut auth = service().await;
        let mut out = Vec::new();
        cmd_register(
            &mut auth,
            "alice",
            "alice@example.com",
            &mut Cursor::new("secret1\nsecret1\n"),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(auth.current_user().unwrap().username, "alice");
        assert!(text(out).contains("Welcome to Earth Saver, alice!"));
    }

    #[tokio::test]
    async fn register_rejects_mismatched_confirmation() {
        let mut auth = service().await;
        let err = cmd_register(
            &mut auth,
            "alice",
            "alice@example.com",
            &mut Cursor::new("secret1\nsecret2\n"),
            &mut Vec::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "Passwords do not match");
        assert!(auth.users().is_empty());
    }

    #[tokio::test]
    async fn login_failure_keeps_store_message() {
        let mut auth = service().await;
        let err = cmd_login(&mut auth, "nobody", &mut Cursor::new("secret1\n"), &mut Vec::new())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Login failed");
        assert_eq!(err.root_cause().to_string(), "Invalid username or password");
    }

    #[tokio::test]
    async fn logout_without_session_is_harmless() {
        let mut auth = service().await;
        let mut out = Vec::new();
        cmd_logout(&mut auth, &mut out).await.unwrap();
        assert!(text(out).contains("Not logged in."));
    }

    #[tokio::test]
    async fn profile_lists_stats_and_achievements() {
        let mut auth = service().await;
        auth.register("alice", "alice@example.com", "secret1")
            .await
            .unwrap();
        auth.login("alice", "secret1").await.unwrap();
        auth.update_user_stats(&GameResult {
            score: 1_200,
            earth_health: 95,
            correct_answers: 8,
            questions_answered: 10,
            max_streak: 6,
            final_streak: 2,
        })
        .await
        .unwrap();

        let mut out = Vec::new();
        cmd_profile(&auth, &mut out).unwrap();
        let out = text(out);

        assert!(out.contains("Level 1  (120 / 1000 XP to next level)"));
        assert!(out.contains("Best score:       1200"));
        assert!(out.contains("8 / 10 (80%)"));
        assert!(out.contains("Eco Rookie"));
        assert!(out.contains("Planet Protector"));
    }

    #[tokio::test]
    async fn profile_requires_session() {
        let auth = service().await;
        assert!(cmd_profile(&auth, &mut Vec::new()).is_err());
    }

    #[tokio::test]
    async fn leaderboard_ranks_players() {
        let mut auth = service().await;
        for (name, score) in [("alice", 300), ("bob", 900)] {
            auth.register(name, &format!("{name}@example.com"), "secret1")
                .await
                .unwrap();
            auth.login(name, "secret1").await.unwrap();
            auth.update_user_stats(&GameResult {
                score,
                ..GameResult::default()
            })
            .await
            .unwrap();
        }

        let mut out = Vec::new();
        cmd_leaderboard(&auth, &mut out).unwrap();
        let out = text(out);

        let bob = out.find("bob").unwrap();
        let alice = out.find("alice").unwrap();
        assert!(bob < alice);
    }

    #[tokio::test]
    async fn delete_account_can_be_cancelled() {
        let mut auth = service().await;
        auth.register("alice", "alice@example.com", "secret1")
            .await
            .unwrap();
        auth.login("alice", "secret1").await.unwrap();

        let mut out = Vec::new();
        cmd_delete_account(&mut auth, None, &mut Cursor::new("n\n"), &mut out)
            .await
            .unwrap();
        assert!(text(out).contains("Cancelled."));
        assert!(auth.users().get("alice").is_some());

        cmd_delete_account(&mut auth, None, &mut Cursor::new("y\nsecret1\n"), &mut Vec::new())
            .await
            .unwrap();
        assert!(auth.users().get("alice").is_none());
        assert!(!auth.is_logged_in());
    }

    #[tokio::test]
    async fn delete_account_requires_session() {
        let mut auth = service().await;
        let err = cmd_delete_account(&mut auth, None, &mut Cursor::new(""), &mut Vec::new())
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Not logged in"));
    }
}
