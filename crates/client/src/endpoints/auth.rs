//! Identity provider endpoints: login, refresh, logout.
//!
//! Each function performs exactly one HTTP call and never caches.
//!
//! The provider answers login in snake_case (`access_token`) and refresh in
//! camelCase (`accessToken`); both spellings are accepted on both endpoints.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::auth::{Credential, UserSnapshot};
use crate::error::{ClientError, Result};
use crate::metrics::{self, Outcome};

/// Successful login: the credential plus the user record, if the provider sent one.
#[derive(Debug, Clone)]
pub struct LoginGrant {
    pub credential: Credential,
    pub user: Option<UserSnapshot>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default, rename = "accessToken", alias = "access_token")]
    access_token: Option<String>,
    #[serde(default, rename = "refreshToken", alias = "refresh_token")]
    refresh_token: Option<String>,
    #[serde(default)]
    user: Option<serde_json::Value>,
}

/// Statuses the provider uses to reject a username/password pair.
fn is_credential_rejection(status: StatusCode) -> bool {
    matches!(status.as_u16(), 400 | 401 | 403 | 422)
}

/// Login with username and password.
///
/// # Errors
///
/// Returns [`ClientError::InvalidCredentials`] when the provider rejects the pair.
/// Returns [`ClientError::ProviderUnavailable`] for transport failures, other
/// non-2xx statuses, and 2xx bodies without an access token.
pub async fn login(
    client: &Client,
    base_url: &str,
    path: &str,
    username: &str,
    password: &str,
) -> Result<LoginGrant> {
    debug!(username = %username, "Logging in");

    let url = format!("{}{}", base_url, path);
    let response = client
        .post(&url)
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .map_err(|e| {
            metrics::record_login(Outcome::Unavailable);
            ClientError::ProviderUnavailable(e.to_string())
        })?;

    let status = response.status();
    if is_credential_rejection(status) {
        metrics::record_login(Outcome::Rejected);
        return Err(ClientError::InvalidCredentials);
    }
    if !status.is_success() {
        metrics::record_login(Outcome::Unavailable);
        return Err(ClientError::ProviderUnavailable(format!(
            "login returned HTTP {}",
            status.as_u16()
        )));
    }

    let body: TokenResponse = response.json().await.map_err(|e| {
        metrics::record_login(Outcome::Unavailable);
        ClientError::ProviderUnavailable(format!("malformed login response: {e}"))
    })?;

    let credential = Credential::new(body.access_token.unwrap_or_default(), body.refresh_token)
        .map_err(|_| {
            metrics::record_login(Outcome::Unavailable);
            ClientError::ProviderUnavailable("login response has no access token".to_string())
        })?;

    let user = body
        .user
        .and_then(|value| match serde_json::from_value::<UserSnapshot>(value) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Ignoring malformed user record in login response");
                None
            }
        });

    metrics::record_login(Outcome::Success);
    Ok(LoginGrant { credential, user })
}

/// Exchange a refresh token for a new credential.
///
/// The returned credential carries whatever refresh token the provider sent,
/// possibly none; merging with the previous one is the caller's concern.
///
/// # Errors
///
/// Every failure (transport, non-2xx, malformed body) is
/// [`ClientError::RefreshRejected`].
pub async fn refresh(
    client: &Client,
    base_url: &str,
    path: &str,
    refresh_token: &str,
) -> Result<Credential> {
    debug!("Refreshing access token");

    let url = format!("{}{}", base_url, path);
    let result = async {
        let response = client
            .post(&url)
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .map_err(|e| format!("transport error: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status.as_u16()));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| format!("malformed body: {e}"))?;
        Credential::new(body.access_token.unwrap_or_default(), body.refresh_token)
            .map_err(|_| "no access token in response".to_string())
    }
    .await;

    match result {
        Ok(credential) => {
            metrics::record_refresh(Outcome::Success);
            Ok(credential)
        }
        Err(reason) => {
            debug!(reason = %reason, "Refresh rejected");
            metrics::record_refresh(Outcome::Rejected);
            Err(ClientError::RefreshRejected)
        }
    }
}

/// Notify the provider of a logout. Best-effort: failures are logged only.
pub async fn logout(client: &Client, base_url: &str, path: &str, bearer: Option<String>) {
    let url = format!("{}{}", base_url, path);
    let mut builder = client.post(&url);
    if let Some(bearer) = bearer {
        builder = builder.header(reqwest::header::AUTHORIZATION, bearer);
    }

    match builder.send().await {
        Ok(response) if response.status().is_success() => debug!("Provider acknowledged logout"),
        Ok(response) => warn!(
            status = response.status().as_u16(),
            "Provider logout returned an error status"
        ),
        Err(e) => warn!(error = %e, "Provider logout notification failed"),
    }
}
