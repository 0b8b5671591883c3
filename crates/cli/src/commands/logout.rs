//! Logout command implementation.

use anyhow::Result;
use blog_config::SessionConfig;

pub async fn run(config: SessionConfig) -> Result<()> {
    let session = crate::commands::build_session(&config)?;
    session.logout().await;
    println!("Logged out");
    Ok(())
}
