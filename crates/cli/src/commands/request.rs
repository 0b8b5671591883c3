//! Request command implementation.
//!
//! Runs one call through the session's authorized request path and prints
//! the response body to stdout. Non-2xx responses print the body and fail.

use anyhow::{Context, Result, bail};
use blog_client::{AuthorizedRequest, Method};
use blog_config::SessionConfig;
use tracing::info;

pub async fn run(
    config: SessionConfig,
    method: String,
    path: String,
    data: Option<String>,
    no_auth: bool,
) -> Result<()> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method: {method}"))?;

    let mut request = AuthorizedRequest::new(method, path);
    if let Some(data) = data {
        let body: serde_json::Value =
            serde_json::from_str(&data).context("--data must be valid JSON")?;
        request = request.json(&body)?;
    }
    if no_auth {
        request = request.skip_auth();
    }

    let session = crate::commands::build_session(&config)?;
    info!(method = %request.method(), path = %request.path(), "Sending request");

    let response = session.authorized_request(&request).await?;
    let status = response.status();
    let body = response
        .text()
        .await
        .context("Failed to read response body")?;

    if !body.is_empty() {
        println!("{body}");
    }
    if !status.is_success() {
        bail!("Request failed with HTTP {}", status.as_u16());
    }
    Ok(())
}
