//! Shared helpers for the CLI subcommands.

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing_subscriber::EnvFilter;

use earthsaver_quiz::QuestionBank;
use earthsaver_store::{Achievement, AuthService, Database, SqliteBlobStore};

use crate::config::AppConfig;

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber with the given default log level.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// Startup
// ---------------------------------------------------------------------------

/// Open the on-disk store and restore any saved session.
pub async fn open_auth(config: &AppConfig) -> Result<AuthService> {
    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!(
            "failed to create data directory {}",
            config.data_dir.display()
        )
    })?;

    let db = Database::open_and_migrate(config.db_path())
        .await
        .context("failed to open database")?;
    AuthService::open(Arc::new(SqliteBlobStore::new(db)), config.auth.clone())
        .await
        .context("failed to load accounts")
}

pub fn load_bank(config: &AppConfig) -> Result<QuestionBank> {
    match &config.questions {
        Some(path) => QuestionBank::from_path(path)
            .with_context(|| format!("failed to load questions from {}", path.display())),
        None => QuestionBank::builtin().context("built-in question bank is invalid"),
    }
}

// ---------------------------------------------------------------------------
// Achievement banner
// ---------------------------------------------------------------------------

pub fn achievement_banner(achievement: &Achievement) -> String {
    format!(
        "  {} Achievement unlocked: {} -- {}",
        achievement.icon, achievement.name, achievement.description
    )
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// Print `label` and read one trimmed line. End of input is an error.
pub fn prompt(stdin: &mut dyn BufRead, out: &mut dyn Write, label: &str) -> Result<String> {
    write!(out, "  {label}: ")?;
    out.flush()?;

    let mut line = String::new();
    if stdin.read_line(&mut line)? == 0 {
        bail!("input closed");
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

/// Ask a yes/no question; anything but `y`/`yes` is no.
pub fn confirm(stdin: &mut dyn BufRead, out: &mut dyn Write, question: &str) -> Result<bool> {
    let answer = prompt(stdin, out, &format!("{question} [y/N]"))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
