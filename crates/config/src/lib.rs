//! Configuration management for the blog session core.
//!
//! This crate provides types and loaders for locating the identity provider
//! and choosing where session credentials are stored, from `.env` files,
//! environment variables, and explicit overrides.

pub mod constants;
mod loader;
pub mod paths;
pub mod types;

pub use loader::{ConfigError, ConfigLoader, StoreSelection, env_var_or_none};
pub use types::{ProviderConfig, SessionConfig, TokenStoreKind};
