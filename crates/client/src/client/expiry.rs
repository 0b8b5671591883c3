//! Session-expiry listeners.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::debug;

type Callback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    callbacks: Vec<(u64, Callback)>,
}

/// Registered `on_expired` callbacks.
#[derive(Default, Clone)]
pub(crate) struct ExpiryListeners {
    inner: Arc<Mutex<Registry>>,
}

impl std::fmt::Debug for ExpiryListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiryListeners")
            .field("count", &self.len())
            .finish()
    }
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ExpiryListeners {
    pub(crate) fn subscribe(&self, callback: Callback) -> ExpirySubscription {
        let mut registry = lock(&self.inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.callbacks.push((id, callback));
        ExpirySubscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Invoke every callback. The registry lock is released first so a
    /// callback may subscribe or unsubscribe.
    pub(crate) fn notify(&self) {
        let callbacks: Vec<Callback> = lock(&self.inner)
            .callbacks
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        debug!(listeners = callbacks.len(), "Notifying session expiry");
        for callback in callbacks {
            callback();
        }
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.inner).callbacks.len()
    }
}

/// Handle returned by `Session::on_expired`.
///
/// Dropping the handle keeps the callback registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
#[derive(Debug)]
pub struct ExpirySubscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl ExpirySubscription {
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).callbacks.retain(|(id, _)| *id != self.id);
        }
    }
}
