//! Status command implementation.
//!
//! Prints the session state and, when the access token is a JWT, its expiry.
//! Expiry is informational; an opaque token prints as `unknown`.

use anyhow::Result;
use blog_config::SessionConfig;
use chrono::{DateTime, Utc};

pub async fn run(config: SessionConfig) -> Result<()> {
    let session = crate::commands::build_session(&config)?;

    println!("State:   {}", session.state().as_str());
    if let Some(user) = session.current_user() {
        println!("User:    {}", user.username);
    }
    if session.is_authenticated() {
        println!("Expires: {}", format_expiry(session.expires_at_millis()));
    }
    Ok(())
}

fn format_expiry(expires_at_millis: Option<i64>) -> String {
    expires_at_millis
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string())
}
