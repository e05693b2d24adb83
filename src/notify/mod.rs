//! Change notification: debounced file watches and post-reload listeners.

pub mod subscriber;

#[cfg(feature = "file-watch")]
pub mod registry;
#[cfg(feature = "file-watch")]
pub mod watcher;

pub use subscriber::{ReloadListeners, SubscriptionHandle};

#[cfg(feature = "file-watch")]
pub use registry::WatchRegistry;
#[cfg(feature = "file-watch")]
pub use watcher::{ConfigWatcher, WatchHandle};
