//! Blog API session client.
//!
//! This crate owns the credential lifecycle of the blog application: login,
//! storage of the access/refresh pair, single-flight renewal on 401, and
//! logout. Application code goes through [`Session`] and never sees the raw
//! auth endpoints.

mod auth;
pub mod client;
pub mod endpoints;
pub mod error;
mod executor;
mod issuer;
pub mod metrics;
mod refresh;
pub mod store;

pub use auth::{Credential, SessionState, UserSnapshot};
pub use client::builder::SessionBuilder;
pub use client::{ExpirySubscription, Session};
pub use error::{ClientError, LoginFailure, Result};
pub use executor::AuthorizedRequest;
pub use reqwest::{Method, Response, StatusCode};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
