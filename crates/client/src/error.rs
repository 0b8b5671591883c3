//! Error types for the session client.

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur during session operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The provider rejected the username/password pair.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The provider could not be reached or answered unexpectedly during login.
    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The refresh token is missing, invalid, expired, or the refresh call failed.
    #[error("Refresh token rejected")]
    RefreshRejected,

    /// The session could not be renewed; the caller must re-authenticate.
    #[error("Session expired, please re-authenticate")]
    SessionExpired,

    /// Transport-level error on an authorized call, passed through untouched.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The outbound request could not be built (bad method, header, or body).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A 2xx response from the provider did not have the expected shape.
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Why a login attempt failed, as reported to the page layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    InvalidCredentials,
    ProviderUnavailable,
}

impl LoginFailure {
    pub const fn as_str(&self) -> &'static str {
        match self {
            LoginFailure::InvalidCredentials => "InvalidCredentials",
            LoginFailure::ProviderUnavailable => "ProviderUnavailable",
        }
    }
}

impl ClientError {
    /// Check if this error means the caller has to (re-)authenticate.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials | Self::RefreshRejected | Self::SessionExpired
        )
    }

    /// Check if the user can simply try again (bad input or a flaky provider).
    pub fn is_retryable_by_user(&self) -> bool {
        matches!(self, Self::InvalidCredentials | Self::ProviderUnavailable(_))
    }

    /// Map a login error onto the collaborator-facing failure reason.
    ///
    /// Anything that is not an explicit credential rejection counts as the
    /// provider being unavailable.
    pub fn login_failure_reason(&self) -> LoginFailure {
        match self {
            Self::InvalidCredentials => LoginFailure::InvalidCredentials,
            _ => LoginFailure::ProviderUnavailable,
        }
    }
}
