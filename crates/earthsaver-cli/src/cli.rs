//! CLI argument definitions for Earth Saver.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Earth Saver -- an environmental trivia game.
#[derive(Parser)]
#[command(
    name = "earthsaver",
    version,
    about = "Earth Saver -- environmental trivia in your terminal",
    long_about = "Answer environmental questions to keep the planet healthy. Accounts, \
                  stats, levels and achievements are stored locally."
)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, short, global = true, default_value = "config/default.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account and log into it.
    Register {
        username: String,
        email: String,
    },

    /// Log into an existing account.
    Login { username: String },

    /// End the current session.
    Logout,

    /// Show the logged-in player's stats and achievements.
    Profile,

    /// Play one round.
    Play,

    /// Show the top players by best score.
    Leaderboard,

    /// Permanently delete the logged-in account.
    DeleteAccount {
        /// Account to delete. Defaults to the logged-in user.
        username: Option<String>,
    },
}
