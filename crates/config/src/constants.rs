//! Centralized constants for the blog session workspace.
//!
//! This module contains default values used across crates to avoid
//! magic number duplication and improve maintainability.

// =============================================================================
// Connection & Timeout Defaults
// =============================================================================

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum allowed request timeout in seconds (1 hour).
pub const MAX_TIMEOUT_SECS: u64 = 3600;

// =============================================================================
// Identity Provider Endpoints
// =============================================================================

/// Default login endpoint path on the identity provider.
pub const DEFAULT_LOGIN_PATH: &str = "/api/login";

/// Default refresh endpoint path on the identity provider.
pub const DEFAULT_REFRESH_PATH: &str = "/api/auth/refresh";

/// Default logout endpoint path on the identity provider.
pub const DEFAULT_LOGOUT_PATH: &str = "/api/logout";

// =============================================================================
// Token Storage
// =============================================================================

/// Storage key for the access token.
pub const ACCESS_TOKEN_KEY: &str = "blog_session.access_token";

/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "blog_session.refresh_token";

/// Storage key for the serialized user snapshot.
pub const USER_KEY: &str = "blog_session.user";

/// Application directory name used for platform config paths.
pub const APP_DIR_NAME: &str = "blog-session";

/// File name of the persisted session document.
pub const SESSION_FILE_NAME: &str = "session.json";
