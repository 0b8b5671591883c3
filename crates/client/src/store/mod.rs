//! Token storage strategies.
//!
//! A [`TokenStore`] owns the persisted credential and the cached user
//! snapshot for one execution context. Implementations never fail: an
//! unavailable medium reads as absent and writes become no-ops.
//!
//! # Strategies
//! - [`MemoryTokenStore`]: one instance per logical context (a server-handled
//!   request, a test), nothing ambient.
//! - [`FileTokenStore`]: a JSON document on disk, shared by every process that
//!   opens the same path. Other processes observe changes on their next read.
//!
//! # Invariants
//! - `set`/`clear` are visible to the next `get` on the same instance.
//! - `clear` removes the credential and the user snapshot together.
//! - `replace_if`/`clear_if` compare and write under one lock, so a write
//!   fenced on a stale access token never lands.

mod file;
mod memory;

use std::fmt;
use std::sync::Arc;

use blog_config::TokenStoreKind;

use crate::auth::{Credential, UserSnapshot};

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

/// Persistence for the current credential and user snapshot.
pub trait TokenStore: Send + Sync + fmt::Debug {
    /// Current credential, or `None` when absent or unreadable.
    fn get(&self) -> Option<Credential>;

    /// Replace the stored credential.
    fn set(&self, credential: &Credential);

    /// Cached user snapshot, for display only.
    fn user(&self) -> Option<UserSnapshot>;

    /// Replace the cached user snapshot.
    fn set_user(&self, user: &UserSnapshot);

    /// Remove credential and user snapshot.
    fn clear(&self);

    /// Replace the credential only while the stored access token is
    /// `expected`. Returns whether the write happened.
    fn replace_if(&self, expected: &str, credential: &Credential) -> bool;

    /// Clear only while the stored access token is `expected`. Returns
    /// whether the store was cleared.
    fn clear_if(&self, expected: &str) -> bool;
}

fn holds(credential: Option<&Credential>, expected: &str) -> bool {
    credential.is_some_and(|c| c.access_token() == expected)
}

/// Build the store selected by configuration.
pub fn from_kind(kind: &TokenStoreKind) -> Arc<dyn TokenStore> {
    match kind {
        TokenStoreKind::Memory => Arc::new(MemoryTokenStore::new()),
        TokenStoreKind::File { path } => Arc::new(FileTokenStore::new(path.clone())),
    }
}
