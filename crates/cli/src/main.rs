//! Blog CLI - Command-line front end for the blog session core.
//!
//! Responsibilities:
//! - Parse command-line arguments and environment variables.
//! - Build the session configuration and run one command.
//! - Map failures to structured exit codes.
//!
//! Does NOT handle:
//! - Token lifecycle or HTTP details (see `crates/client`).
//!
//! Invariants:
//! - `load_dotenv()` is called BEFORE CLI parsing to allow `.env` to provide clap defaults.
//! - The CLI persists the session to a file by default so consecutive
//!   invocations share it; `BLOG_TOKEN_STORE=memory` opts out.

mod args;
mod commands;
mod dispatch;
mod error;

use anyhow::{Context, Result};
use args::Cli;
use blog_config::{ConfigLoader, SessionConfig, StoreSelection};
use clap::Parser;
use dispatch::run_command;
use error::{Cancelled, ExitCode, ExitCodeExt};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    // Load .env file BEFORE CLI parsing so clap env defaults can read .env values
    if let Err(e) = ConfigLoader::new().load_dotenv() {
        eprintln!("Failed to load environment: {}", e);
        std::process::exit(ExitCode::GeneralError.as_i32());
    }

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to build configuration: {:#}", e);
            std::process::exit(ExitCode::GeneralError.as_i32());
        }
    };

    let result = tokio::select! {
        res = run_command(cli.command, config) => res,
        _ = tokio::signal::ctrl_c() => Err(Cancelled.into()),
    };

    let exit_code = match result {
        Ok(()) => ExitCode::Success,
        Err(e) if e.is::<Cancelled>() => {
            eprintln!("^C\nOperation cancelled by user");
            ExitCode::Interrupted
        }
        Err(e) => {
            eprintln!("{:#}", e);
            e.exit_code()
        }
    };

    std::process::exit(exit_code.as_i32());
}

/// Resolve configuration: file store by default, then env, then CLI flags.
fn build_config(cli: &Cli) -> Result<SessionConfig> {
    let mut loader = ConfigLoader::new()
        .with_store(StoreSelection::File)
        .from_env()
        .context("Failed to load configuration from environment")?;

    if let Some(ref url) = cli.base_url {
        loader = loader.with_base_url(url.clone());
    }
    if let Some(ref path) = cli.session_file {
        loader = loader.with_session_file(path.clone());
    }
    if let Some(timeout_secs) = cli.timeout {
        loader = loader.with_timeout(std::time::Duration::from_secs(timeout_secs));
    }

    Ok(loader.build()?)
}
