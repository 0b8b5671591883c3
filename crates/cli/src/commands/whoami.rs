//! Whoami command implementation.

use anyhow::Result;
use blog_config::SessionConfig;

use crate::error::NotLoggedIn;

pub async fn run(config: SessionConfig) -> Result<()> {
    let session = crate::commands::build_session(&config)?;
    let user = session.current_user().ok_or(NotLoggedIn)?;

    println!("{}", serde_json::to_string_pretty(&user)?);
    Ok(())
}
