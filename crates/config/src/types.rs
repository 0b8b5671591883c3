//! Configuration types for the blog session core.
//!
//! Responsibilities:
//! - Define the identity provider endpoint settings.
//! - Define the token storage strategy selection.
//! - Define the top-level `SessionConfig` combining both.
//!
//! Does NOT handle:
//! - Configuration loading from env/dotenv (see `loader` module).
//! - Actual network calls or token persistence (see client crate).
//!
//! Invariants:
//! - Duration fields are serialized as seconds (integers).
//! - Endpoint paths always begin with `/`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_LOGIN_PATH, DEFAULT_LOGOUT_PATH, DEFAULT_REFRESH_PATH, DEFAULT_TIMEOUT_SECS,
};

/// Module for serializing Duration as seconds (integer).
mod duration_seconds {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Location of the identity provider and its three auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the provider (e.g., http://localhost:8080), without trailing slash.
    pub base_url: String,
    pub login_path: String,
    pub refresh_path: String,
    pub logout_path: String,
}

impl ProviderConfig {
    /// Provider config with the default endpoint paths.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            logout_path: DEFAULT_LOGOUT_PATH.to_string(),
        }
    }
}

/// Where the session credential lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TokenStoreKind {
    /// Held only in process memory; scoped to one logical execution context.
    Memory,
    /// Persisted to a JSON document shared by every process that opens it.
    File { path: PathBuf },
}

/// Complete configuration for a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub provider: ProviderConfig,
    /// Per-request timeout (serialized as seconds)
    #[serde(with = "duration_seconds")]
    pub timeout: Duration,
    pub store: TokenStoreKind,
}

impl SessionConfig {
    /// In-memory session config against the given provider, with default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            provider: ProviderConfig::with_base_url(base_url),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            store: TokenStoreKind::Memory,
        }
    }
}
