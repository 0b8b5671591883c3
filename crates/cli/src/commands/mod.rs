//! CLI command implementations.

pub mod login;
pub mod logout;
pub mod request;
pub mod status;
pub mod whoami;

use anyhow::{Context, Result};
use blog_client::Session;
use blog_config::SessionConfig;

/// Build a session from the loaded configuration.
pub fn build_session(config: &SessionConfig) -> Result<Session> {
    Session::builder()
        .from_config(config)
        .build()
        .context("Failed to build session")
}
