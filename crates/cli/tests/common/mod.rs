//! Shared test utilities for blog-cli integration tests.
//!
//! Responsibilities:
//! - Provide a hermetic CLI command factory that prevents dotenv loading.
//! - Point every command at a throwaway session file.
//!
//! Invariants / Assumptions:
//! - All integration tests using this helper are hermetic by default.

use std::path::Path;

use assert_cmd::Command;

/// Returns a hermetic `blog-cli` command for integration testing.
///
/// It ensures:
/// - `DOTENV_DISABLED=1` is set to prevent local `.env` contamination.
/// - `BLOG_*` variables from the host are cleared.
pub fn blog_cmd() -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("blog-cli");

    cmd.env("DOTENV_DISABLED", "1");

    cmd.env_remove("BLOG_BASE_URL")
        .env_remove("BLOG_LOGIN_PATH")
        .env_remove("BLOG_REFRESH_PATH")
        .env_remove("BLOG_LOGOUT_PATH")
        .env_remove("BLOG_TIMEOUT")
        .env_remove("BLOG_SESSION_FILE")
        .env_remove("BLOG_TOKEN_STORE")
        .env_remove("BLOG_PASSWORD");

    cmd
}

/// Hermetic command against `base_url` using the session file at `session_file`.
#[allow(dead_code)]
pub fn blog_cmd_for(base_url: &str, session_file: &Path) -> Command {
    let mut cmd = blog_cmd();
    cmd.env("BLOG_BASE_URL", base_url);
    cmd.env("BLOG_SESSION_FILE", session_file);
    cmd
}

/// Write a session file holding `access` and `refresh` tokens.
#[allow(dead_code)]
pub fn write_session(path: &Path, access: &str, refresh: Option<&str>) {
    let mut document = serde_json::json!({ "blog_session.access_token": access });
    if let Some(refresh) = refresh {
        document["blog_session.refresh_token"] = serde_json::Value::from(refresh);
    }
    std::fs::write(path, serde_json::to_string(&document).unwrap()).unwrap();
}
