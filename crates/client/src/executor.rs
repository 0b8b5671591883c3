//! Authorized request execution.
//!
//! Sends application calls with the stored access token. A 401 triggers one
//! renewal (through the [`RefreshCoordinator`]) and exactly one retry.
//!
//! # What this module does NOT handle:
//! - Expiry notification (the `Session` facade owns listeners)
//! - Any retry on 5xx, timeouts, or transport errors
//!
//! # Invariants
//! - At most two HTTP attempts per logical call.
//! - Only 401 is treated as an auth failure; 403 and every other status is
//!   returned to the caller untouched.
//! - When renewal fails, or the retried call is also 401, the store is
//!   cleared before [`ClientError::SessionExpired`] is returned. The clear
//!   only applies while the store still holds the token that was sent, so a
//!   login or logout in the meantime is left alone.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};

use crate::auth::Credential;
use crate::error::{ClientError, Result};
use crate::issuer::IssuerClient;
use crate::metrics;
use crate::refresh::RefreshCoordinator;
use crate::store::TokenStore;

/// An application call to run through [`Executor::execute`].
///
/// `path` is joined to the provider base URL unless it is already absolute.
#[derive(Debug, Clone)]
pub struct AuthorizedRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    skip_auth: bool,
    retry_on_auth_error: bool,
}

impl AuthorizedRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
            skip_auth: false,
            retry_on_auth_error: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a header.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] if the name or value is not a
    /// valid HTTP header.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ClientError::InvalidRequest(format!("header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ClientError::InvalidRequest(format!("header value for '{name}': {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Set a raw body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value)
            .map_err(|e| ClientError::InvalidRequest(format!("unserializable body: {e}")))?;
        self.body = Some(body);
        Ok(self)
    }

    /// Send without a bearer token and never attempt renewal.
    pub fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }

    /// Report a 401 as session expiry instead of refreshing and retrying.
    pub fn no_auth_retry(mut self) -> Self {
        self.retry_on_auth_error = false;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn skips_auth(&self) -> bool {
        self.skip_auth
    }
}

/// Runs [`AuthorizedRequest`]s against the provider base URL.
#[derive(Debug)]
pub struct Executor {
    http: Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    issuer: IssuerClient,
    coordinator: RefreshCoordinator,
}

impl Executor {
    pub fn new(http: Client, issuer: IssuerClient, store: Arc<dyn TokenStore>) -> Self {
        Self {
            http,
            base_url: issuer.provider().base_url.clone(),
            store,
            issuer,
            coordinator: RefreshCoordinator::new(),
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.coordinator.is_refreshing()
    }

    /// Execute `request`, renewing the credential once on 401.
    ///
    /// # Errors
    ///
    /// - [`ClientError::SessionExpired`] when renewal is impossible or the
    ///   retried call is still unauthorized. The store is already cleared.
    /// - [`ClientError::Http`] for transport failures, on either attempt.
    /// - [`ClientError::InvalidRequest`] if the stored token cannot be sent
    ///   as a header value.
    pub async fn execute(&self, request: &AuthorizedRequest) -> Result<Response> {
        if request.skip_auth {
            return self.send(request, None, false).await;
        }

        let sent = self.store.get();
        let response = self.send(request, sent.as_ref(), false).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(method = %request.method, path = %request.path, "Authorized call returned 401");
        if !request.retry_on_auth_error {
            return Err(self.expire(sent.as_ref(), "auth retry disabled for this call"));
        }

        let renewed = match self.renewed_credential(sent.as_ref()).await {
            Ok(credential) => credential,
            Err(_) => return Err(self.expire(sent.as_ref(), "refresh rejected")),
        };

        let retried = self.send(request, Some(&renewed), true).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            return Err(self.expire(Some(&renewed), "retried call still unauthorized"));
        }
        Ok(retried)
    }

    /// Credential to retry with after a 401.
    async fn renewed_credential(&self, sent: Option<&Credential>) -> Result<Credential> {
        // Another caller may have refreshed (or logged in) while this call
        // was in flight; the stored token is then newer than the one sent.
        if let Some(current) = self.store.get() {
            let rotated = sent.is_none_or(|s| s.access_token() != current.access_token());
            if rotated {
                debug!("Stored credential changed since the call was sent, skipping refresh");
                return Ok(current);
            }
        }
        self.coordinator.refresh(&self.issuer, &self.store).await
    }

    /// Clear the store if it still holds `sent`, and report expiry.
    fn expire(&self, sent: Option<&Credential>, reason: &str) -> ClientError {
        match sent {
            Some(sent) if self.store.clear_if(sent.access_token()) => {
                warn!(reason, "Session expired, cleared stored credential");
            }
            _ => debug!(reason, "Call unauthorized, stored session left as is"),
        }
        ClientError::SessionExpired
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn send(
        &self,
        request: &AuthorizedRequest,
        credential: Option<&Credential>,
        retry: bool,
    ) -> Result<Response> {
        let mut headers = request.headers.clone();
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        match credential {
            Some(credential) => {
                let value = HeaderValue::from_str(&credential.bearer_header()).map_err(|_| {
                    ClientError::InvalidRequest(
                        "stored access token is not a valid header value".to_string(),
                    )
                })?;
                headers.insert(AUTHORIZATION, value);
            }
            None if !request.skip_auth => {
                debug!(path = %request.path, "No credential stored, sending without bearer token");
            }
            None => {}
        }

        let mut builder = self
            .http
            .request(request.method.clone(), self.url_for(&request.path))
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        metrics::record_attempt(retry);
        Ok(builder.send().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTokenStore;
    use blog_config::ProviderConfig;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn executor_for(server: &MockServer, store: Arc<dyn TokenStore>) -> Executor {
        let http = Client::new();
        let issuer = IssuerClient::new(http.clone(), ProviderConfig::with_base_url(server.uri()));
        Executor::new(http, issuer, store)
    }

    fn store_with(access: &str, refresh: Option<&str>) -> Arc<dyn TokenStore> {
        Arc::new(MemoryTokenStore::with_credential(
            Credential::new(access, refresh.map(str::to_string)).unwrap(),
        ))
    }

    #[test]
    fn test_invalid_header_rejected() {
        let result = AuthorizedRequest::get("/api/posts").header("bad header", "x");
        assert!(matches!(result, Err(ClientError::InvalidRequest(_))));
    }

    #[test]
    fn test_request_defaults() {
        let request = AuthorizedRequest::post("/api/posts");
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.path(), "/api/posts");
        assert!(!request.skip_auth);
        assert!(request.retry_on_auth_error);
    }

    #[tokio::test]
    async fn test_url_joining() {
        let server = MockServer::start().await;
        let executor = executor_for(&server, Arc::new(MemoryTokenStore::new()));
        let base = server.uri();

        assert_eq!(executor.url_for("/api/posts"), format!("{base}/api/posts"));
        assert_eq!(executor.url_for("api/posts"), format!("{base}/api/posts"));
        assert_eq!(
            executor.url_for("https://other.example.com/x"),
            "https://other.example.com/x"
        );
    }

    #[tokio::test]
    async fn test_default_content_type_and_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .and(header("authorization", "Bearer A1"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let executor = executor_for(&server, store_with("A1", Some("R1")));
        let response = executor
            .execute(&AuthorizedRequest::get("/api/posts"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_explicit_content_type_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .and(header("content-type", "text/plain"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let executor = executor_for(&server, store_with("A1", None));
        let request = AuthorizedRequest::post("/api/upload")
            .header("Content-Type", "text/plain")
            .unwrap()
            .body("hello");
        let response = executor.execute(&request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_forbidden_is_not_an_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/admin"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let store = store_with("A1", Some("R1"));
        let executor = executor_for(&server, Arc::clone(&store));
        let response = executor
            .execute(&AuthorizedRequest::get("/api/admin"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(store.get().is_some());
    }

    #[tokio::test]
    async fn test_no_auth_retry_expires_without_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let store = store_with("A1", Some("R1"));
        let executor = executor_for(&server, Arc::clone(&store));
        let result = executor
            .execute(&AuthorizedRequest::get("/api/posts").no_auth_retry())
            .await;

        assert!(matches!(result, Err(ClientError::SessionExpired)));
        assert!(store.get().is_none());
    }

    #[tokio::test]
    async fn test_expiry_leaves_newer_credential_alone() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(200)))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_with("A1", Some("R1"));
        let executor = executor_for(&server, Arc::clone(&store));
        let request = AuthorizedRequest::get("/api/posts").no_auth_retry();

        let (result, ()) = tokio::join!(executor.execute(&request), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            store.set(&Credential::new("B1", Some("RB".to_string())).unwrap());
        });

        assert!(matches!(result, Err(ClientError::SessionExpired)));
        assert_eq!(store.get().unwrap().access_token(), "B1");
    }

    #[tokio::test]
    async fn test_skip_auth_sends_no_bearer_and_passes_401_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/public"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_with("A1", Some("R1"));
        let executor = executor_for(&server, Arc::clone(&store));
        let response = executor
            .execute(&AuthorizedRequest::get("/api/public").skip_auth())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let received = server.received_requests().await.unwrap();
        assert!(received[0].headers.get("authorization").is_none());
        assert!(store.get().is_some());
    }

    #[tokio::test]
    async fn test_stale_401_retries_with_stored_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .and(header("authorization", "Bearer A2"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let store = store_with("A2", Some("R1"));
        let executor = executor_for(&server, Arc::clone(&store));
        let stale = Credential::new("A1", Some("R1".to_string())).unwrap();

        let renewed = executor.renewed_credential(Some(&stale)).await.unwrap();
        assert_eq!(renewed.access_token(), "A2");

        let response = executor
            .send(&AuthorizedRequest::get("/api/posts"), Some(&renewed), true)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_transport_error_passes_through() {
        let store = store_with("A1", Some("R1"));
        let http = Client::new();
        // Port 1 on localhost refuses connections.
        let issuer = IssuerClient::new(
            http.clone(),
            ProviderConfig::with_base_url("http://127.0.0.1:1"),
        );
        let executor = Executor::new(http, issuer, Arc::clone(&store));

        let result = executor.execute(&AuthorizedRequest::get("/api/posts")).await;
        assert!(matches!(result, Err(ClientError::Http(_))));
        assert!(store.get().is_some());
    }
}
