//! CLI entry point for Earth Saver.
//!
//! This binary provides the `earthsaver` command. Every invocation opens the
//! local store, restores the saved session and runs one subcommand, so a
//! login persists until `earthsaver logout`.

mod account;
mod cli;
mod config;
mod helpers;
mod play;

use std::io;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;
    helpers::init_tracing(&config.log_level);
    debug!(
        config = %cli.config.display(),
        data_dir = %config.data_dir.display(),
        "configuration loaded"
    );

    let mut auth = helpers::open_auth(&config).await?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    match cli.command {
        Commands::Register { username, email } => {
            account::cmd_register(&mut auth, &username, &email, &mut input, &mut out).await
        }
        Commands::Login { username } => {
            account::cmd_login(&mut auth, &username, &mut input, &mut out).await
        }
        Commands::Logout => account::cmd_logout(&mut auth, &mut out).await,
        Commands::Profile => account::cmd_profile(&auth, &mut out),
        Commands::Play => play::cmd_play(&mut auth, &config, &mut input, &mut out).await,
        Commands::Leaderboard => account::cmd_leaderboard(&auth, &mut out),
        Commands::DeleteAccount { username } => {
            account::cmd_delete_account(&mut auth, username.as_deref(), &mut input, &mut out)
                .await
        }
    }
}
