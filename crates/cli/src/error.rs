//! CLI exit codes for scripting and automation.
//!
//! Responsibilities:
//! - Define structured exit codes that scripts can use to distinguish error types.
//! - Map ClientError variants to appropriate exit codes.
//!
//! Does NOT handle:
//! - Error message formatting (handled by anyhow Display).
//!
//! Invariants:
//! - Exit code 130 is reserved for SIGINT (Unix standard: 128 + SIGINT).

use std::fmt;

use blog_client::ClientError;

/// Structured exit codes for blog-cli.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,

    /// Unhandled or generic failure, including non-2xx responses to `request`.
    GeneralError = 1,

    /// Invalid credentials, expired session, or not logged in.
    ///
    /// Scripts should run `blog-cli login` again.
    AuthenticationFailed = 2,

    /// Provider unreachable, timeout, or DNS failure.
    ///
    /// Scripts may retry with backoff.
    ConnectionError = 3,

    /// Interrupted by SIGINT/Ctrl+C (128 + 2).
    Interrupted = 130,
}

impl ExitCode {
    /// Convert the exit code to an i32 for use with std::process::exit().
    pub const fn as_i32(self) -> i32 {
        self as u8 as i32
    }
}

impl From<&ClientError> for ExitCode {
    fn from(err: &ClientError) -> Self {
        match err {
            ClientError::InvalidCredentials
            | ClientError::RefreshRejected
            | ClientError::SessionExpired => ExitCode::AuthenticationFailed,

            ClientError::ProviderUnavailable(_) | ClientError::InvalidUrl(_) => {
                ExitCode::ConnectionError
            }

            ClientError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    ExitCode::ConnectionError
                } else {
                    ExitCode::GeneralError
                }
            }

            ClientError::InvalidRequest(_) | ClientError::InvalidResponse(_) => {
                ExitCode::GeneralError
            }
        }
    }
}

/// Command required a stored session and there was none.
#[derive(Debug, Clone, Copy)]
pub struct NotLoggedIn;

impl fmt::Display for NotLoggedIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Not logged in. Run `blog-cli login` first.")
    }
}

impl std::error::Error for NotLoggedIn {}

/// User pressed Ctrl+C.
#[derive(Debug, Clone, Copy)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Extension trait for anyhow::Error to extract exit codes.
pub trait ExitCodeExt {
    /// Returns ExitCode::GeneralError if no known error is in the chain.
    fn exit_code(&self) -> ExitCode;
}

impl ExitCodeExt for anyhow::Error {
    fn exit_code(&self) -> ExitCode {
        for cause in self.chain() {
            if let Some(client_err) = cause.downcast_ref::<ClientError>() {
                return ExitCode::from(client_err);
            }
            if cause.is::<NotLoggedIn>() {
                return ExitCode::AuthenticationFailed;
            }
            if cause.is::<Cancelled>() {
                return ExitCode::Interrupted;
            }
        }
        ExitCode::GeneralError
    }
}
