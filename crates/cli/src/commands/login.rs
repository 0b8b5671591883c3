//! Login command implementation.

use anyhow::{Result, bail};
use blog_config::SessionConfig;
use tracing::info;

pub async fn run(config: SessionConfig, username: String, password: Option<String>) -> Result<()> {
    let Some(password) = password.filter(|p| !p.is_empty()) else {
        bail!("A password is required: pass --password or set BLOG_PASSWORD");
    };

    let session = crate::commands::build_session(&config)?;
    info!("Logging in to {}", session.base_url());

    let user = session.login(&username, &password).await?;
    println!("Logged in as {}", user.username);
    Ok(())
}
