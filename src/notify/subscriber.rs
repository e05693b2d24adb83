//! Callbacks invoked after a domain reload has been applied.

use crate::domain::Domain;
use parking_lot::RwLock;
use std::sync::Arc;

type Listener = Arc<dyn Fn(Domain) + Send + Sync>;

/// Handle for a subscription that can be dropped to unsubscribe.
///
/// When the handle is dropped, the listener is removed immediately.
pub struct SubscriptionHandle {
    id: usize,
    registry: Arc<RwLock<ListenersInner>>,
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.registry
            .write()
            .listeners
            .retain(|(listener_id, _)| *listener_id != self.id);
    }
}

struct ListenersInner {
    listeners: Vec<(usize, Listener)>,
    next_id: usize,
}

/// Registry of reload listeners.
///
/// Each listener receives the domain that was just reloaded.
///
/// # Examples
///
/// ```rust
/// use hotswap_reconcile::domain::Domain;
/// use hotswap_reconcile::notify::ReloadListeners;
///
/// let listeners = ReloadListeners::new();
/// let handle = listeners.subscribe(|domain| {
///     println!("{} reloaded", domain);
/// });
///
/// listeners.notify_all(Domain::AgentPeers);
///
/// // Unsubscribe by dropping the handle
/// drop(handle);
/// assert_eq!(listeners.subscriber_count(), 0);
/// ```
#[derive(Clone)]
pub struct ReloadListeners {
    inner: Arc<RwLock<ListenersInner>>,
}

impl ReloadListeners {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(ListenersInner {
                listeners: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Register `callback`. Keep the returned handle alive for as long as the
    /// callback should fire.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(Domain) + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push((id, Arc::new(callback)));

        SubscriptionHandle {
            id,
            registry: Arc::clone(&self.inner),
        }
    }

    /// Call every listener in subscription order.
    ///
    /// The listener list is snapshotted first, so a callback may subscribe or
    /// unsubscribe without deadlocking.
    pub fn notify_all(&self, domain: Domain) {
        let listeners: Vec<Listener> = self
            .inner
            .read()
            .listeners
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(domain);
        }
    }

    /// Get the number of active listeners.
    pub fn subscriber_count(&self) -> usize {
        self.inner.read().listeners.len()
    }
}

impl Default for ReloadListeners {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ReloadListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadListeners")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
