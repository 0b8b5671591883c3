//! Credential issuer client.
//!
//! Thin handle bundling the HTTP client with the provider's endpoint paths.
//! Cloning is cheap (`reqwest::Client` is reference-counted), which lets the
//! refresh coordinator move a copy into its shared refresh future.

use blog_config::ProviderConfig;
use reqwest::Client;

use crate::auth::Credential;
use crate::endpoints::{self, LoginGrant};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct IssuerClient {
    http: Client,
    provider: ProviderConfig,
}

impl IssuerClient {
    pub fn new(http: Client, provider: ProviderConfig) -> Self {
        Self { http, provider }
    }

    pub fn provider(&self) -> &ProviderConfig {
        &self.provider
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginGrant> {
        endpoints::login(
            &self.http,
            &self.provider.base_url,
            &self.provider.login_path,
            username,
            password,
        )
        .await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<Credential> {
        endpoints::refresh(
            &self.http,
            &self.provider.base_url,
            &self.provider.refresh_path,
            refresh_token,
        )
        .await
    }

    /// Best-effort logout notification, carrying the current credential if any.
    pub async fn logout(&self, credential: Option<&Credential>) {
        endpoints::logout(
            &self.http,
            &self.provider.base_url,
            &self.provider.logout_path,
            credential.map(Credential::bearer_header),
        )
        .await
    }
}
