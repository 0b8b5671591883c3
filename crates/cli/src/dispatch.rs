//! Command dispatch logic.
//!
//! Responsibilities:
//! - Route parsed CLI arguments to appropriate command handlers.
//!
//! Does NOT handle:
//! - CLI structure definitions (see `args` module).
//! - Configuration loading (see `main()`).

use anyhow::Result;
use blog_config::SessionConfig;

use crate::args::Commands;
use crate::commands;

pub(crate) async fn run_command(command: Commands, config: SessionConfig) -> Result<()> {
    match command {
        Commands::Login { username, password } => {
            commands::login::run(config, username, password).await?;
        }
        Commands::Logout => {
            commands::logout::run(config).await?;
        }
        Commands::Whoami => {
            commands::whoami::run(config).await?;
        }
        Commands::Status => {
            commands::status::run(config).await?;
        }
        Commands::Request {
            method,
            path,
            data,
            no_auth,
        } => {
            commands::request::run(config, method, path, data, no_auth).await?;
        }
    }

    Ok(())
}
