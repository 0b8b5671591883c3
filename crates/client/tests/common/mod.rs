//! Common test utilities for integration tests.
//!
//! Helpers mount the identity provider endpoints on a wiremock server and
//! build sessions pointed at it.
//!
//! # What this does NOT handle
//! - Application endpoint mocks (tests mount those themselves)

use std::sync::Arc;
use std::time::Duration;

#[allow(unused_imports)]
pub use blog_client::{
    AuthorizedRequest, ClientError, Credential, MemoryTokenStore, Session, SessionState,
    StatusCode, TokenStore,
};
#[allow(unused_imports)]
pub use wiremock::{Mock, MockServer, ResponseTemplate};

use wiremock::matchers::{method, path};

/// Session against `server` using `store`.
#[allow(dead_code)]
pub fn session_for(server: &MockServer, store: Arc<dyn TokenStore>) -> Session {
    Session::builder()
        .base_url(server.uri())
        .store(store)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// Memory store already holding `access` and optionally `refresh`.
#[allow(dead_code)]
pub fn store_with(access: &str, refresh: Option<&str>) -> Arc<dyn TokenStore> {
    Arc::new(MemoryTokenStore::with_credential(
        Credential::new(access, refresh.map(str::to_string)).unwrap(),
    ))
}

/// Mount a refresh endpoint answering with `template`, expected `calls` times.
#[allow(dead_code)]
pub async fn mount_refresh(server: &MockServer, template: ResponseTemplate, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(template)
        .expect(calls)
        .mount(server)
        .await;
}

/// Mount a login endpoint answering with `template`.
#[allow(dead_code)]
pub async fn mount_login(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(template)
        .mount(server)
        .await;
}
