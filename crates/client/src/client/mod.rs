//! The blog session facade.
//!
//! [`Session`] is the only type the application layer talks to. It wires the
//! token store, the credential issuer, and the authorized request executor
//! together and owns session-expiry notification.
//!
//! # Submodules
//! - [`builder`]: Session construction and configuration
//! - `expiry`: `on_expired` listener registry
//!
//! # What this module does NOT handle:
//! - HTTP details of the auth endpoints (delegated to [`crate::endpoints`])
//! - Refresh serialization (delegated to [`crate::refresh::RefreshCoordinator`])
//! - Where tokens live (delegated to [`crate::store::TokenStore`])
//!
//! # Invariants
//! - A failed login leaves the store untouched.
//! - `logout` always clears the store, whatever the provider answers.
//! - `on_expired` listeners fire once per transition into the expired
//!   state, after the store has been cleared.
//! - Only a call that carried a credential can expire the session, and only
//!   if no login or logout happened while it ran.

pub mod builder;
mod expiry;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use reqwest::Response;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::auth::{SessionState, UserSnapshot};
use crate::error::{ClientError, Result};
use crate::executor::{AuthorizedRequest, Executor};
use crate::issuer::IssuerClient;
use crate::metrics;
use crate::store::TokenStore;

pub use expiry::ExpirySubscription;
use expiry::ExpiryListeners;

/// Blog API session: login state, token renewal, and authorized calls.
///
/// # Creating a Session
///
/// ```rust,ignore
/// use blog_client::Session;
///
/// let session = Session::builder()
///     .base_url("http://localhost:8080".to_string())
///     .build()?;
///
/// let user = session.login("admin", "123456").await?;
/// let response = session
///     .authorized_request(&AuthorizedRequest::get("/api/posts"))
///     .await?;
/// ```
#[derive(Debug)]
pub struct Session {
    store: Arc<dyn TokenStore>,
    issuer: IssuerClient,
    executor: Executor,
    listeners: ExpiryListeners,
    expired: AtomicBool,
    // Bumped by login and logout.
    generation: AtomicU64,
    auth_tx: watch::Sender<bool>,
}

impl Session {
    /// Create a new session builder.
    pub fn builder() -> builder::SessionBuilder {
        builder::SessionBuilder::new()
    }

    pub(crate) fn from_parts(
        http: reqwest::Client,
        issuer: IssuerClient,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        let executor = Executor::new(http, issuer.clone(), Arc::clone(&store));
        let (auth_tx, _) = watch::channel(store.get().is_some());
        Self {
            store,
            issuer,
            executor,
            listeners: ExpiryListeners::default(),
            expired: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            auth_tx,
        }
    }

    /// Base URL of the identity provider.
    pub fn base_url(&self) -> &str {
        &self.issuer.provider().base_url
    }

    /// Log in and store the issued credential and user snapshot.
    ///
    /// When the provider returns no user record, a snapshot is synthesized
    /// from `username`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidCredentials`] or
    /// [`ClientError::ProviderUnavailable`]; in both cases nothing is stored.
    /// Use [`ClientError::login_failure_reason`] for the collaborator-facing reason.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserSnapshot> {
        let grant = match self.issuer.login(username, password).await {
            Ok(grant) => grant,
            Err(e) => {
                warn!(username = %username, error = %e, "Login failed");
                return Err(e);
            }
        };

        let user = grant
            .user
            .unwrap_or_else(|| UserSnapshot::from_username(username));
        self.store.set(&grant.credential);
        self.store.set_user(&user);
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.expired.store(false, Ordering::SeqCst);
        self.publish_auth_state();

        info!(username = %user.username, "Logged in");
        Ok(user)
    }

    /// Clear the session and notify the provider, best effort.
    ///
    /// Never fails; calling it while unauthenticated is a no-op locally.
    pub async fn logout(&self) {
        let credential = self.store.get();
        self.store.clear();
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.expired.store(false, Ordering::SeqCst);
        self.publish_auth_state();

        self.issuer.logout(credential.as_ref()).await;
        info!("Logged out");
    }

    /// Cached user snapshot, present only while a credential is stored.
    pub fn current_user(&self) -> Option<UserSnapshot> {
        self.store.get()?;
        self.store.user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.get().is_some()
    }

    /// Expiry of the stored access token in epoch milliseconds, for display.
    ///
    /// `None` when unauthenticated or when the token is opaque.
    pub fn expires_at_millis(&self) -> Option<i64> {
        self.store.get()?.expires_at_millis()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        if self.store.get().is_none() {
            if self.expired.load(Ordering::SeqCst) {
                SessionState::Expired
            } else {
                SessionState::Unauthenticated
            }
        } else if self.executor.is_refreshing() {
            SessionState::Refreshing
        } else {
            SessionState::Authenticated
        }
    }

    /// Run an application call with the stored credential.
    ///
    /// A 401 triggers at most one refresh and one retry. Any other status is
    /// returned as a normal response.
    ///
    /// # Errors
    ///
    /// - [`ClientError::SessionExpired`] when the session could not be
    ///   renewed. The store is cleared and `on_expired` listeners have run,
    ///   unless the call carried no credential or a login or logout replaced
    ///   the session while it ran.
    /// - [`ClientError::Http`] for transport failures.
    pub async fn authorized_request(&self, request: &AuthorizedRequest) -> Result<Response> {
        let generation = self.generation.load(Ordering::SeqCst);
        let had_credential = !request.skips_auth() && self.store.get().is_some();
        // A credential written by another process re-arms expiry notification.
        if had_credential {
            self.expired.store(false, Ordering::SeqCst);
        }

        let result = self.executor.execute(request).await;
        match &result {
            Err(ClientError::SessionExpired)
                if had_credential && self.generation.load(Ordering::SeqCst) == generation =>
            {
                self.mark_expired();
            }
            Err(ClientError::SessionExpired) => {
                debug!(path = %request.path(), "Unauthorized call did not expire a session");
                self.publish_auth_state();
            }
            Ok(_) => self.publish_auth_state(),
            Err(_) => {}
        }
        result
    }

    /// Register a callback run when the session transitions to expired.
    ///
    /// The callback runs synchronously on the task that observed the expiry,
    /// so it should return quickly.
    pub fn on_expired<F>(&self, callback: F) -> ExpirySubscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.subscribe(Arc::new(callback))
    }

    /// Watch channel carrying `is_authenticated()` after each transition.
    pub fn auth_changes(&self) -> watch::Receiver<bool> {
        self.auth_tx.subscribe()
    }

    fn mark_expired(&self) {
        self.publish_auth_state();
        if self
            .expired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            metrics::record_expired();
            info!("Session expired");
            self.listeners.notify();
        } else {
            debug!("Session already expired, listeners not notified again");
        }
    }

    fn publish_auth_state(&self) {
        let authenticated = self.is_authenticated();
        self.auth_tx.send_if_modified(|current| {
            if *current == authenticated {
                false
            } else {
                *current = authenticated;
                true
            }
        });
    }
}
