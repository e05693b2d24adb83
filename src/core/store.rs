//! Snapshot store for singleton configuration domains.

use arc_swap::ArcSwap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Holds the last applied value of one configuration domain.
///
/// Reads are lock-free `Arc` loads; a replace publishes the new value
/// atomically, so readers see either the old or the new snapshot and never a
/// mix of both.
///
/// # Examples
///
/// ```rust
/// use hotswap_reconcile::core::ConfigStore;
///
/// let store = ConfigStore::new(1);
/// let previous = store.replace(2);
/// assert_eq!(*previous, 1);
/// assert_eq!(*store.get(), 2);
/// assert_eq!(store.generation(), 1);
/// ```
pub struct ConfigStore<T> {
    current: Arc<ArcSwap<T>>,
    generation: Arc<AtomicU64>,
}

impl<T> ConfigStore<T> {
    /// Create a store holding `initial` at generation 0.
    pub fn new(initial: T) -> Self {
        Self {
            current: Arc::new(ArcSwap::new(Arc::new(initial))),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Get a reference-counted handle to the current value.
    ///
    /// This is lock-free; readers never block the reload path.
    pub fn get(&self) -> Arc<T> {
        self.current.load_full()
    }

    /// Publish `value` and return the value it replaced.
    pub fn replace(&self, value: T) -> Arc<T> {
        let previous = self.current.swap(Arc::new(value));
        self.generation.fetch_add(1, Ordering::AcqRel);
        previous
    }

    /// Number of replacements since creation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

impl<T: Default> Default for ConfigStore<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Clone for ConfigStore<T> {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
            generation: Arc::clone(&self.generation),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ConfigStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("current", &self.get())
            .field("generation", &self.generation())
            .finish()
    }
}
