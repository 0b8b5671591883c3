//! Identity provider endpoint implementations.

mod auth;

pub use auth::{LoginGrant, login, logout, refresh};
