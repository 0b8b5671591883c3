//! In-memory token store.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{TokenStore, holds};
use crate::auth::{Credential, UserSnapshot};

#[derive(Debug, Default)]
struct Slot {
    credential: Option<Credential>,
    user: Option<UserSnapshot>,
}

/// Token store holding the session in process memory.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Slot>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store already holding `credential`.
    pub fn with_credential(credential: Credential) -> Self {
        let store = Self::new();
        store.set(&credential);
        store
    }

    // A panic while holding the lock cannot leave the slot half-written.
    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<Credential> {
        self.slot().credential.clone()
    }

    fn set(&self, credential: &Credential) {
        self.slot().credential = Some(credential.clone());
    }

    fn user(&self) -> Option<UserSnapshot> {
        self.slot().user.clone()
    }

    fn set_user(&self, user: &UserSnapshot) {
        self.slot().user = Some(user.clone());
    }

    fn clear(&self) {
        let mut slot = self.slot();
        slot.credential = None;
        slot.user = None;
    }

    fn replace_if(&self, expected: &str, credential: &Credential) -> bool {
        let mut slot = self.slot();
        if !holds(slot.credential.as_ref(), expected) {
            return false;
        }
        slot.credential = Some(credential.clone());
        true
    }

    fn clear_if(&self, expected: &str) -> bool {
        let mut slot = self.slot();
        if !holds(slot.credential.as_ref(), expected) {
            return false;
        }
        slot.credential = None;
        slot.user = None;
        true
    }
}
