//! Single-flight coordination of token refreshes.
//!
//! Any number of callers may ask for a refreshed credential at once; at most
//! one refresh call reaches the provider. The first caller to find no
//! operation in flight starts one and publishes its handle; everyone else
//! awaits that same handle. Refresh tokens may be single-use, so a second
//! concurrent refresh could evict a session that is still valid.
//!
//! # Invariants
//! - At most one refresh operation exists at a time.
//! - The operation writes its outcome to the store *before* it clears its
//!   handle: the merged credential on success, a cleared store on failure.
//!   A caller arriving after the handle is gone never refreshes with a
//!   refresh token that was already spent.
//! - Both writes are fenced on the access token the refresh started from.
//!   A login or logout that lands while the call is in flight wins, and the
//!   refresh settles as rejected.
//! - The handle is cleared when the operation settles, success or failure;
//!   the next refresh request starts a fresh operation.
//! - Without a refresh token the request fails immediately and no operation
//!   is started.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info};

use crate::auth::Credential;
use crate::error::{ClientError, Result};
use crate::issuer::IssuerClient;
use crate::store::TokenStore;

/// Settled refresh outcome; `None` means the provider rejected the refresh.
type SharedRefresh = Shared<BoxFuture<'static, Option<Credential>>>;

struct InFlight {
    id: u64,
    operation: SharedRefresh,
}

type Slot = Arc<Mutex<Option<InFlight>>>;

fn lock(slot: &Slot) -> MutexGuard<'_, Option<InFlight>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Collapses concurrent refresh requests into one provider call.
#[derive(Default)]
pub struct RefreshCoordinator {
    in_flight: Slot,
    next_id: AtomicU64,
}

impl fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refreshing", &self.is_refreshing())
            .finish()
    }
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a refresh operation is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        lock(&self.in_flight).is_some()
    }

    /// Obtain a refreshed credential, joining the in-flight refresh if one exists.
    ///
    /// On success the new credential is already in `store`; the provider's
    /// refresh token is kept unless it sent a rotated one. On failure the
    /// store has been cleared.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RefreshRejected`] if the store holds no refresh
    /// token or the provider refresh fails for any reason. Every waiter on the
    /// same operation receives the same outcome.
    pub async fn refresh(
        &self,
        issuer: &IssuerClient,
        store: &Arc<dyn TokenStore>,
    ) -> Result<Credential> {
        let operation = {
            let mut slot = lock(&self.in_flight);
            match slot.as_ref() {
                Some(in_flight) => {
                    debug!(refresh_id = in_flight.id, "Joining in-flight refresh");
                    in_flight.operation.clone()
                }
                None => {
                    let Some((started_from, refresh_token)) = store.get().and_then(|c| {
                        let refresh = c.refresh_token()?.to_string();
                        Some((c.access_token().to_string(), refresh))
                    }) else {
                        debug!("No refresh token available, refresh rejected");
                        return Err(ClientError::RefreshRejected);
                    };

                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let operation = run_refresh(
                        id,
                        issuer.clone(),
                        Arc::clone(store),
                        Arc::clone(&self.in_flight),
                        started_from,
                        refresh_token,
                    )
                    .boxed()
                    .shared();
                    *slot = Some(InFlight {
                        id,
                        operation: operation.clone(),
                    });
                    operation
                }
            }
        };

        operation.await.ok_or(ClientError::RefreshRejected)
    }
}

async fn run_refresh(
    id: u64,
    issuer: IssuerClient,
    store: Arc<dyn TokenStore>,
    slot: Slot,
    started_from: String,
    refresh_token: String,
) -> Option<Credential> {
    debug!(refresh_id = id, "Starting refresh");

    let outcome = match issuer.refresh(&refresh_token).await {
        Ok(credential) => {
            let credential = credential.or_refresh_token(Some(&refresh_token));
            if store.replace_if(&started_from, &credential) {
                info!(refresh_id = id, "Access token refreshed");
                Some(credential)
            } else {
                info!(refresh_id = id, "Session changed during refresh, discarding result");
                None
            }
        }
        Err(_) => {
            if !store.clear_if(&started_from) {
                debug!(refresh_id = id, "Session changed during refresh, store left as is");
            }
            None
        }
    };

    let mut guard = lock(&slot);
    if guard.as_ref().is_some_and(|in_flight| in_flight.id == id) {
        *guard = None;
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTokenStore;
    use blog_config::ProviderConfig;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn issuer_for(server: &MockServer) -> IssuerClient {
        IssuerClient::new(
            reqwest::Client::new(),
            ProviderConfig::with_base_url(server.uri()),
        )
    }

    fn store_with(access: &str, refresh: Option<&str>) -> Arc<dyn TokenStore> {
        Arc::new(MemoryTokenStore::with_credential(
            Credential::new(access, refresh.map(str::to_string)).unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_refresh_preserves_refresh_token_and_stores_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .and(body_json(serde_json::json!({ "refreshToken": "R1" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "accessToken": "A2" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let coordinator = RefreshCoordinator::new();
        let store = store_with("A1", Some("R1"));
        let credential = coordinator
            .refresh(&issuer_for(&server), &store)
            .await
            .unwrap();

        assert_eq!(credential.access_token(), "A2");
        assert_eq!(credential.refresh_token(), Some("R1"));
        let stored = store.get().unwrap();
        assert_eq!(stored.access_token(), "A2");
        assert_eq!(stored.refresh_token(), Some("R1"));
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_missing_refresh_token_fails_without_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let coordinator = RefreshCoordinator::new();
        let store = store_with("A1", None);
        let result = coordinator.refresh(&issuer_for(&server), &store).await;

        assert!(matches!(result, Err(ClientError::RefreshRejected)));
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "accessToken": "A2", "refreshToken": "R2" }))
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let coordinator = RefreshCoordinator::new();
        let store = store_with("A1", Some("R1"));
        let issuer = issuer_for(&server);

        let results =
            futures::future::join_all((0..8).map(|_| coordinator.refresh(&issuer, &store))).await;

        for result in results {
            let credential = result.unwrap();
            assert_eq!(credential.access_token(), "A2");
            assert_eq!(credential.refresh_token(), Some("R2"));
        }
    }

    #[tokio::test]
    async fn test_failure_fans_out_to_all_waiters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(ResponseTemplate::new(403).set_delay(Duration::from_millis(50)))
            .expect(1)
            .mount(&server)
            .await;

        let coordinator = RefreshCoordinator::new();
        let store = store_with("A1", Some("R1"));
        let issuer = issuer_for(&server);

        let results =
            futures::future::join_all((0..4).map(|_| coordinator.refresh(&issuer, &store))).await;

        assert!(
            results
                .iter()
                .all(|r| matches!(r, Err(ClientError::RefreshRejected)))
        );
        assert!(store.get().is_none());
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_result_discarded_when_store_cleared_mid_flight() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "accessToken": "A2" }))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let coordinator = RefreshCoordinator::new();
        let store = store_with("A1", Some("R1"));
        let issuer = issuer_for(&server);

        let (result, ()) = tokio::join!(coordinator.refresh(&issuer, &store), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            store.clear();
        });

        assert!(matches!(result, Err(ClientError::RefreshRejected)));
        assert!(store.get().is_none());
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_failure_keeps_credential_written_mid_flight() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(ResponseTemplate::new(403).set_delay(Duration::from_millis(200)))
            .expect(1)
            .mount(&server)
            .await;

        let coordinator = RefreshCoordinator::new();
        let store = store_with("A1", Some("R1"));
        let issuer = issuer_for(&server);

        let (result, ()) = tokio::join!(coordinator.refresh(&issuer, &store), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            store.set(&Credential::new("B1", Some("RB".to_string())).unwrap());
        });

        assert!(matches!(result, Err(ClientError::RefreshRejected)));
        assert_eq!(store.get().unwrap().access_token(), "B1");
    }

    #[tokio::test]
    async fn test_settled_operation_is_not_reused() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "accessToken": "A2" })),
            )
            .expect(2)
            .mount(&server)
            .await;

        let coordinator = RefreshCoordinator::new();
        let store = store_with("A1", Some("R1"));
        let issuer = issuer_for(&server);

        coordinator.refresh(&issuer, &store).await.unwrap();
        coordinator.refresh(&issuer, &store).await.unwrap();
    }
}
