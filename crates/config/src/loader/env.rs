//! Environment variable parsing for configuration.
//!
//! Responsibilities:
//! - Read and parse `BLOG_*` environment variables.
//! - Apply environment variable values to a ConfigLoader instance.
//!
//! Invariants:
//! - Empty or whitespace-only environment variables are treated as unset.
//! - Returned values are trimmed (leading/trailing whitespace removed).
//! - Invalid numeric values return ConfigError::InvalidValue.

use std::path::PathBuf;
use std::time::Duration;

use super::builder::{ConfigLoader, StoreSelection};
use super::error::ConfigError;

/// Read an environment variable, returning None if unset, empty, or whitespace-only.
/// Returns the trimmed value (leading/trailing whitespace removed) if present.
pub fn env_var_or_none(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == s.len() {
            Some(s)
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Apply environment variable configuration to the loader.
pub fn apply_env(loader: &mut ConfigLoader) -> Result<(), ConfigError> {
    if let Some(url) = env_var_or_none("BLOG_BASE_URL") {
        loader.set_base_url(Some(url));
    }
    if let Some(path) = env_var_or_none("BLOG_LOGIN_PATH") {
        loader.set_login_path(Some(path));
    }
    if let Some(path) = env_var_or_none("BLOG_REFRESH_PATH") {
        loader.set_refresh_path(Some(path));
    }
    if let Some(path) = env_var_or_none("BLOG_LOGOUT_PATH") {
        loader.set_logout_path(Some(path));
    }
    if let Some(timeout) = env_var_or_none("BLOG_TIMEOUT") {
        let secs: u64 = timeout.parse().map_err(|_| ConfigError::InvalidValue {
            var: "BLOG_TIMEOUT".to_string(),
            message: "must be a number".to_string(),
        })?;
        loader.set_timeout(Some(Duration::from_secs(secs)));
    }
    if let Some(kind) = env_var_or_none("BLOG_TOKEN_STORE") {
        let selection = match kind.to_ascii_lowercase().as_str() {
            "memory" => StoreSelection::Memory,
            "file" => StoreSelection::File,
            _ => {
                return Err(ConfigError::InvalidValue {
                    var: "BLOG_TOKEN_STORE".to_string(),
                    message: "must be memory or file".to_string(),
                });
            }
        };
        loader.set_store(Some(selection));
    }
    if let Some(path) = env_var_or_none("BLOG_SESSION_FILE") {
        loader.set_session_file(Some(PathBuf::from(path)));
    }
    Ok(())
}
