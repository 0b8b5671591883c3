//! Tests for the configuration loader.
//!
//! Invariants:
//! - Tests use `serial_test` to prevent environment variable pollution.
//! - Tests use `global_test_lock()` for additional synchronization.
//! - Temporary directories are cleaned up automatically via `tempfile`.

use std::sync::Mutex;


/// Returns the global test lock for environment variable isolation.
pub fn env_lock() -> &'static Mutex<()> {
    crate::test_util::global_test_lock()
}

/// Every `BLOG_*` variable the loader reads, for clearing host leakage.
pub const BLOG_VARS: &[&str] = &[
    "BLOG_BASE_URL",
    "BLOG_LOGIN_PATH",
    "BLOG_REFRESH_PATH",
    "BLOG_LOGOUT_PATH",
    "BLOG_TIMEOUT",
    "BLOG_TOKEN_STORE",
    "BLOG_SESSION_FILE",
];

/// Run `f` with every `BLOG_*` variable unset except the given overrides.
pub fn with_blog_env<F: FnOnce()>(overrides: &[(&str, &str)], f: F) {
    let vars: Vec<(&str, Option<&str>)> = BLOG_VARS
        .iter()
        .map(|key| {
            let value = overrides
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| *v);
            (*key, value)
        })
        .collect();
    temp_env::with_vars(vars, f);
}
