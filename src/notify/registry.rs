//! Ownership of every active domain watch.

use crate::domain::Domain;
use crate::notify::watcher::{ConfigWatcher, WatchHandle};
use parking_lot::Mutex;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

/// Holds one debounced watch per domain file so they can be closed together.
#[derive(Debug)]
pub struct WatchRegistry {
    watcher: ConfigWatcher,
    handles: Mutex<Vec<(Domain, WatchHandle)>>,
}

impl WatchRegistry {
    /// Create an empty registry whose watches use the given debounce window.
    pub fn new(debounce: Duration) -> Self {
        Self {
            watcher: ConfigWatcher::new(debounce),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Watch every `(domain, path)` target, calling `on_change(domain)` after
    /// each debounced change.
    ///
    /// Watches from an earlier call are closed first. A target that cannot be
    /// watched is logged and skipped. Returns the number of active watches.
    pub fn start_all<I, F, Fut>(&self, targets: I, on_change: F) -> usize
    where
        I: IntoIterator<Item = (Domain, PathBuf)>,
        F: Fn(Domain) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.stop_all();

        let mut started = Vec::new();
        for (domain, path) in targets {
            let callback = on_change.clone();
            match self.watcher.watch(&path, move || callback(domain)) {
                Ok(handle) => started.push((domain, handle)),
                Err(e) => {
                    tracing::error!(domain = %domain, path = %path.display(), error = %e, "Failed to watch config file");
                }
            }
        }

        let mut handles = self.handles.lock();
        handles.extend(started);
        handles.len()
    }

    /// Close every watch. Returns how many were closed.
    pub fn stop_all(&self) -> usize {
        let closed: Vec<_> = std::mem::take(&mut *self.handles.lock());
        let count = closed.len();
        for (_, handle) in closed {
            handle.close();
        }
        if count > 0 {
            tracing::info!(count, "Config watchers stopped");
        }
        count
    }

    /// The domains and paths currently watched.
    pub fn watched(&self) -> Vec<(Domain, PathBuf)> {
        self.handles
            .lock()
            .iter()
            .map(|(domain, handle)| (*domain, handle.path().to_path_buf()))
            .collect()
    }

    /// Number of active watches.
    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    /// Whether no watch is active.
    pub fn is_empty(&self) -> bool {
        self.handles.lock().is_empty()
    }
}

impl Drop for WatchRegistry {
    fn drop(&mut self) {
        self.stop_all();
    }
}
