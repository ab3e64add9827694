//! Application configuration.
//!
//! Read from a TOML file (by default `config/default.toml`), then overridden
//! from the environment:
//! - `EARTHSAVER_DATA_DIR` -- where the database lives
//! - `EARTHSAVER_LOG` -- default log level when `RUST_LOG` is unset

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use earthsaver_quiz::QuizConfig;
use earthsaver_store::AuthConfig;

/// Database file name inside the data directory.
const DB_FILE: &str = "earthsaver.db";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub log_level: String,
    /// JSON question bank; the built-in bank when unset.
    pub questions: Option<PathBuf>,
    pub auth: AuthConfig,
    pub quiz: QuizConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            log_level: "warn".to_owned(),
            questions: None,
            auth: AuthConfig::default(),
            quiz: QuizConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load `path` and apply environment overrides. A missing file yields
    /// the defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)
                .with_context(|| format!("invalid config file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from `lookup`, which maps a variable name to its value.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("EARTHSAVER_DATA_DIR").filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup("EARTHSAVER_LOG").filter(|v| !v.is_empty()) {
            self.log_level = level;
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }
}
