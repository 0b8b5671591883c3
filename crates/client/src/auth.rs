//! Credential and user types shared by every session component.

use base64::{Engine as _, engine::general_purpose};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Access/refresh credential pair issued by the identity provider.
///
/// The access token is never empty. Expiry is decoded from the token when it
/// is a standard three-segment JWT and is informational only: refresh is
/// driven by observed 401 responses, never by the clock.
#[derive(Debug, Clone)]
pub struct Credential {
    access_token: SecretString,
    refresh_token: Option<SecretString>,
    expires_at_millis: Option<i64>,
}

impl Credential {
    /// Build a credential, rejecting an empty access token.
    ///
    /// An empty refresh token is treated as absent.
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Result<Self> {
        let access_token: String = access_token.into();
        if access_token.trim().is_empty() {
            return Err(ClientError::InvalidResponse(
                "access token must not be empty".to_string(),
            ));
        }
        let expires_at_millis = decode_jwt_expiry(&access_token);
        Ok(Self {
            access_token: SecretString::new(access_token.into()),
            refresh_token: refresh_token
                .filter(|t| !t.trim().is_empty())
                .map(|t| SecretString::new(t.into())),
            expires_at_millis,
        })
    }

    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|t| t.expose_secret())
    }

    /// Expiry in epoch milliseconds, or `None` when the token is opaque.
    ///
    /// `None` means "unknown", never "expired".
    pub fn expires_at_millis(&self) -> Option<i64> {
        self.expires_at_millis
    }

    /// Keep `fallback` as refresh token when the provider did not rotate it.
    pub(crate) fn or_refresh_token(mut self, fallback: Option<&str>) -> Self {
        if self.refresh_token.is_none() {
            self.refresh_token = fallback.map(|t| SecretString::new(t.to_string().into()));
        }
        self
    }

    /// Value for the `Authorization` header.
    pub(crate) fn bearer_header(&self) -> String {
        format!("Bearer {}", self.access_token.expose_secret())
    }
}

/// Decode the `exp` claim of a three-segment JWT into epoch milliseconds.
///
/// Returns `None` for anything that is not a decodable JWT with a numeric `exp`.
fn decode_jwt_expiry(token: &str) -> Option<i64> {
    let mut parts = token.split('.');
    let (_, payload, _) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?;
    let secs = exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))?;
    secs.checked_mul(1000)
}

/// User record cached alongside the credential, for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserSnapshot {
    /// Snapshot for a provider that returned no user record.
    pub(crate) fn from_username(username: &str) -> Self {
        Self {
            id: username.to_string(),
            username: username.to_string(),
            email: None,
        }
    }
}

/// Derived view of where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No credential stored.
    Unauthenticated,
    /// A credential is stored and no refresh is running.
    Authenticated,
    /// A credential is stored and a refresh is in flight.
    Refreshing,
    /// The last refresh failed and the store was cleared.
    Expired,
}

impl SessionState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authenticated => "authenticated",
            SessionState::Refreshing => "refreshing",
            SessionState::Expired => "expired",
        }
    }
}
