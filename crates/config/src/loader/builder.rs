//! Configuration loader builder implementation.
//!
//! Responsibilities:
//! - Provide a builder-pattern `ConfigLoader` for layered configuration merging.
//! - Support loading from `.env`, environment variables, and direct builder methods.
//! - Build and validate the final `SessionConfig`.
//!
//! Does NOT handle:
//! - Direct environment variable parsing logic (delegated to env.rs).
//!
//! Invariants / Assumptions:
//! - Builder methods called after `from_env()` take precedence over environment variables.
//! - `load_dotenv()` must be called explicitly to enable `.env` file loading.
//! - The `DOTENV_DISABLED` variable is checked before `dotenvy::dotenv()` is called.

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use super::env::apply_env;
use super::error::ConfigError;
use crate::constants::{
    DEFAULT_LOGIN_PATH, DEFAULT_LOGOUT_PATH, DEFAULT_REFRESH_PATH, DEFAULT_TIMEOUT_SECS,
    MAX_TIMEOUT_SECS,
};
use crate::paths::default_session_path;
use crate::types::{ProviderConfig, SessionConfig, TokenStoreKind};

/// Requested token storage strategy before path resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSelection {
    Memory,
    File,
}

/// Configuration loader that builds config from environment variables and overrides.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    base_url: Option<String>,
    login_path: Option<String>,
    refresh_path: Option<String>,
    logout_path: Option<String>,
    timeout: Option<Duration>,
    store: Option<StoreSelection>,
    session_file: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if dotenv loading is disabled via environment variable.
    fn dotenv_disabled() -> bool {
        matches!(
            std::env::var("DOTENV_DISABLED").ok().as_deref(),
            Some("true") | Some("1")
        )
    }

    /// Load environment variables from .env file if present.
    ///
    /// If `DOTENV_DISABLED` is set to "true" or "1", the .env file is not loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the `.env` file exists but has invalid syntax
    /// (`ConfigError::DotenvParse`) or cannot be read (`ConfigError::DotenvIo`).
    /// Missing `.env` files are silently ignored.
    pub fn load_dotenv(self) -> Result<Self, ConfigError> {
        if Self::dotenv_disabled() {
            debug!("DOTENV_DISABLED is set, skipping .env");
            return Ok(self);
        }

        match dotenvy::dotenv() {
            Ok(path) => {
                debug!(path = %path.display(), "Loaded .env");
                Ok(self)
            }
            Err(e) if Self::is_not_found(&e) => {
                debug!("No .env file found");
                Ok(self)
            }
            Err(dotenvy::Error::LineParse(_, idx)) => {
                Err(ConfigError::DotenvParse { error_index: idx })
            }
            Err(dotenvy::Error::Io(io_err)) => Err(ConfigError::DotenvIo {
                kind: io_err.kind(),
            }),
            Err(_) => Err(ConfigError::DotenvUnknown),
        }
    }

    fn is_not_found(err: &dotenvy::Error) -> bool {
        matches!(
            err,
            dotenvy::Error::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound
        )
    }

    /// Read configuration from `BLOG_*` environment variables.
    pub fn from_env(mut self) -> Result<Self, ConfigError> {
        apply_env(&mut self)?;
        Ok(self)
    }

    /// Set the provider base URL.
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = Some(url);
        self
    }

    pub fn with_login_path(mut self, path: String) -> Self {
        self.login_path = Some(path);
        self
    }

    pub fn with_refresh_path(mut self, path: String) -> Self {
        self.refresh_path = Some(path);
        self
    }

    pub fn with_logout_path(mut self, path: String) -> Self {
        self.logout_path = Some(path);
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Select the token storage strategy.
    pub fn with_store(mut self, store: StoreSelection) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a file-backed token store at the given path.
    pub fn with_session_file(mut self, path: PathBuf) -> Self {
        self.session_file = Some(path);
        self.store = Some(StoreSelection::File);
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> Result<SessionConfig, ConfigError> {
        let base_url = self
            .base_url
            .as_deref()
            .map(validate_and_normalize_base_url)
            .transpose()?
            .ok_or(ConfigError::MissingBaseUrl)?;

        let provider = ProviderConfig {
            base_url,
            login_path: validate_path(
                "login_path",
                self.login_path.unwrap_or_else(|| DEFAULT_LOGIN_PATH.to_string()),
            )?,
            refresh_path: validate_path(
                "refresh_path",
                self.refresh_path
                    .unwrap_or_else(|| DEFAULT_REFRESH_PATH.to_string()),
            )?,
            logout_path: validate_path(
                "logout_path",
                self.logout_path
                    .unwrap_or_else(|| DEFAULT_LOGOUT_PATH.to_string()),
            )?,
        };

        let timeout = self
            .timeout
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        validate_timeout(timeout)?;

        let selection = self.store.unwrap_or(if self.session_file.is_some() {
            StoreSelection::File
        } else {
            StoreSelection::Memory
        });
        let store = match selection {
            StoreSelection::Memory => TokenStoreKind::Memory,
            StoreSelection::File => {
                let path = match self.session_file {
                    Some(path) => path,
                    None => default_session_path()
                        .map_err(|e| ConfigError::ConfigDirUnavailable(e.to_string()))?,
                };
                TokenStoreKind::File { path }
            }
        };

        match &store {
            TokenStoreKind::Memory => debug!(
                base_url = %provider.base_url,
                timeout_secs = timeout.as_secs(),
                store = "memory",
                "Resolved session config"
            ),
            TokenStoreKind::File { path } => debug!(
                base_url = %provider.base_url,
                timeout_secs = timeout.as_secs(),
                store = "file",
                session_file = %path.display(),
                "Resolved session config"
            ),
        }

        Ok(SessionConfig {
            provider,
            timeout,
            store,
        })
    }

    pub(crate) fn set_base_url(&mut self, url: Option<String>) {
        self.base_url = url;
    }

    pub(crate) fn set_login_path(&mut self, path: Option<String>) {
        self.login_path = path;
    }

    pub(crate) fn set_refresh_path(&mut self, path: Option<String>) {
        self.refresh_path = path;
    }

    pub(crate) fn set_logout_path(&mut self, path: Option<String>) {
        self.logout_path = path;
    }

    pub(crate) fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    pub(crate) fn set_store(&mut self, store: Option<StoreSelection>) {
        self.store = store;
    }

    pub(crate) fn set_session_file(&mut self, path: Option<PathBuf>) {
        self.session_file = path;
    }
}

fn validate_timeout(timeout: Duration) -> Result<(), ConfigError> {
    let timeout_secs = timeout.as_secs();

    if timeout_secs == 0 {
        return Err(ConfigError::InvalidTimeout {
            message: "timeout must be greater than 0 seconds".to_string(),
        });
    }

    if timeout_secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::InvalidTimeout {
            message: format!(
                "timeout exceeds maximum allowed value of {} seconds",
                MAX_TIMEOUT_SECS
            ),
        });
    }

    Ok(())
}

fn validate_path(var: &str, path: String) -> Result<String, ConfigError> {
    let trimmed = path.trim();
    if !trimmed.starts_with('/') {
        return Err(ConfigError::InvalidPath {
            var: var.to_string(),
            path,
        });
    }
    Ok(trimmed.to_string())
}

/// Validates and normalizes a base URL string.
///
/// Validation rules:
/// - Treat blank/whitespace-only as missing
/// - Parse as an absolute http(s) URL with a host
/// - Normalize by stripping trailing slash
fn validate_and_normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(ConfigError::MissingBaseUrl);
    }

    let parsed = url::Url::parse(trimmed).map_err(|e| ConfigError::InvalidValue {
        var: "base_url".into(),
        message: format!(
            "must be an absolute http(s) URL with a host (e.g. http://localhost:8080): {e}"
        ),
    })?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ConfigError::InvalidValue {
            var: "base_url".into(),
            message: format!("scheme must be http or https, got: {scheme}"),
        });
    }

    if parsed.host_str().is_none() {
        return Err(ConfigError::InvalidValue {
            var: "base_url".into(),
            message: "host is required (e.g. http://localhost:8080)".into(),
        });
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}
