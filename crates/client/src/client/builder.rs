//! Session builder for constructing [`Session`] instances.
//!
//! This module is responsible for:
//! - Providing a fluent builder API for session configuration
//! - Validating the provider base URL and normalizing trailing slashes
//! - Selecting the token store (memory unless told otherwise)
//! - Configuring the underlying HTTP client (timeout, redirects)
//!
//! # Invariants
//! - `base_url` is required and must be an absolute http(s) URL.
//! - Every endpoint path begins with `/`.

use std::sync::Arc;
use std::time::Duration;

use blog_config::SessionConfig;
use blog_config::constants::{
    DEFAULT_LOGIN_PATH, DEFAULT_LOGOUT_PATH, DEFAULT_REFRESH_PATH, DEFAULT_TIMEOUT_SECS,
};
use blog_config::ProviderConfig;

use crate::client::Session;
use crate::error::{ClientError, Result};
use crate::issuer::IssuerClient;
use crate::store::{self, MemoryTokenStore, TokenStore};

const MAX_REDIRECTS: usize = 5;

/// Builder for creating a new [`Session`].
///
/// # Example
///
/// ```rust,ignore
/// use blog_client::{FileTokenStore, Session};
/// use std::sync::Arc;
///
/// let session = Session::builder()
///     .base_url("http://localhost:8080".to_string())
///     .store(Arc::new(FileTokenStore::new("/var/lib/blog/session.json")))
///     .timeout(Duration::from_secs(10))
///     .build()?;
/// ```
#[derive(Debug)]
pub struct SessionBuilder {
    base_url: Option<String>,
    login_path: String,
    refresh_path: String,
    logout_path: String,
    timeout: Duration,
    store: Option<Arc<dyn TokenStore>>,
    http: Option<reqwest::Client>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            logout_path: DEFAULT_LOGOUT_PATH.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            store: None,
            http: None,
        }
    }
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identity provider base URL, e.g. `http://localhost:8080`.
    ///
    /// Trailing slashes are removed.
    pub fn base_url(mut self, url: String) -> Self {
        self.base_url = Some(url);
        self
    }

    pub fn login_path(mut self, path: String) -> Self {
        self.login_path = path;
        self
    }

    pub fn refresh_path(mut self, path: String) -> Self {
        self.refresh_path = path;
        self
    }

    pub fn logout_path(mut self, path: String) -> Self {
        self.logout_path = path;
        self
    }

    /// Set the per-request timeout. Default is 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the token store. Default is a fresh [`MemoryTokenStore`].
    pub fn store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a preconfigured HTTP client; `timeout` is then ignored.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Create a session builder from loaded configuration.
    ///
    /// ```rust,ignore
    /// let config = ConfigLoader::new().load_dotenv()?.from_env()?.build()?;
    /// let session = Session::builder().from_config(&config).build()?;
    /// ```
    pub fn from_config(mut self, config: &SessionConfig) -> Self {
        self.base_url = Some(config.provider.base_url.clone());
        self.login_path = config.provider.login_path.clone();
        self.refresh_path = config.provider.refresh_path.clone();
        self.logout_path = config.provider.logout_path.clone();
        self.timeout = config.timeout;
        self.store = Some(store::from_kind(&config.store));
        self
    }

    fn normalize_base_url(url: String) -> String {
        url.trim_end_matches('/').to_string()
    }

    fn check_path(name: &str, path: &str) -> Result<()> {
        if path.starts_with('/') {
            Ok(())
        } else {
            Err(ClientError::InvalidUrl(format!(
                "{name} must start with '/': {path}"
            )))
        }
    }

    /// Build the [`Session`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if `base_url` is missing, is not an
    /// http(s) URL, or an endpoint path is relative.
    /// Returns [`ClientError::Http`] if the HTTP client fails to build.
    pub fn build(self) -> Result<Session> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::InvalidUrl("base_url is required".to_string()))?;
        let base_url = Self::normalize_base_url(base_url);
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidUrl(format!(
                "base_url must be an http(s) URL: {base_url}"
            )));
        }

        Self::check_path("login_path", &self.login_path)?;
        Self::check_path("refresh_path", &self.refresh_path)?;
        Self::check_path("logout_path", &self.logout_path)?;

        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .timeout(self.timeout)
                .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
                .build()?,
        };

        let provider = ProviderConfig {
            base_url,
            login_path: self.login_path,
            refresh_path: self.refresh_path,
            logout_path: self.logout_path,
        };
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryTokenStore::new()));
        let issuer = IssuerClient::new(http.clone(), provider);

        Ok(Session::from_parts(http, issuer, store))
    }
}
