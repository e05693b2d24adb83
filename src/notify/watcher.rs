//! Debounced watching of a single configuration file.

use crate::error::{ConfigError, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Creates debounced watches on configuration files.
///
/// The parent directory is watched rather than the file itself, so a file
/// that is deleted and recreated, or replaced by an editor's atomic rename,
/// keeps triggering. Bursts of events arriving within the debounce window
/// collapse into a single callback, and callbacks for one file never overlap.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_reconcile::notify::ConfigWatcher;
/// use std::time::Duration;
///
/// # async fn example() -> hotswap_reconcile::error::Result<()> {
/// let watcher = ConfigWatcher::new(Duration::from_millis(500));
/// let handle = watcher.watch("/etc/access/ac.toml", || async {
///     println!("ac.toml changed");
/// })?;
///
/// // Later
/// handle.close();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ConfigWatcher {
    debounce_duration: Duration,
}

/// An active watch. Closing or dropping it stops further callbacks; a callback
/// already running is allowed to finish.
pub struct WatchHandle {
    path: PathBuf,
    _watcher: RecommendedWatcher,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ConfigWatcher {
    /// Create a watcher factory with the given debounce window.
    pub fn new(debounce_duration: Duration) -> Self {
        Self { debounce_duration }
    }

    /// Get the debounce duration for this watcher.
    pub fn debounce_duration(&self) -> Duration {
        self.debounce_duration
    }

    /// Call `on_change` whenever the file at `path` is created, modified or
    /// removed.
    ///
    /// The file itself need not exist yet, but its directory must.
    ///
    /// # Errors
    ///
    /// Returns `WatchError` if there is no Tokio runtime, the directory cannot
    /// be resolved, or the OS watch cannot be installed.
    pub fn watch<F, Fut>(&self, path: impl AsRef<Path>, on_change: F) -> Result<WatchHandle>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let path = path.as_ref().to_path_buf();
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ConfigError::WatchError(format!("no async runtime: {}", e)))?;

        let file_name: OsString = path
            .file_name()
            .ok_or_else(|| ConfigError::WatchError(format!("not a file path: {}", path.display())))?
            .to_os_string();
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let directory = parent.canonicalize().map_err(|e| {
            ConfigError::WatchError(format!("failed to resolve {}: {}", parent.display(), e))
        })?;

        // Channel for raw events from notify
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<()>();
        let target = file_name.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let relevant = matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                ) && event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == Some(target.as_os_str()));
                if relevant {
                    let _ = event_tx.send(());
                }
            }
            Err(e) => tracing::error!(error = %e, "Watch error"),
        })
        .map_err(|e| ConfigError::WatchError(format!("failed to create file watcher: {}", e)))?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(|e| {
                ConfigError::WatchError(format!("failed to watch {}: {}", directory.display(), e))
            })?;

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let debounce = self.debounce_duration;
        let watched = directory.join(&file_name);
        let task = runtime.spawn(async move {
            'events: loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break 'events,
                    event = event_rx.recv() => {
                        if event.is_none() {
                            break 'events;
                        }
                    }
                }

                // Swallow the rest of the burst
                let window = sleep(debounce);
                tokio::pin!(window);
                loop {
                    tokio::select! {
                        _ = &mut shutdown_rx => break 'events,
                        _ = &mut window => break,
                        more = event_rx.recv() => {
                            if more.is_none() {
                                break;
                            }
                        }
                    }
                }

                tracing::debug!(path = %watched.display(), "Config file change detected");
                on_change().await;
            }
        });

        tracing::info!(path = %path.display(), "Config watcher started");
        Ok(WatchHandle {
            path,
            _watcher: watcher,
            shutdown: Some(shutdown_tx),
            task,
        })
    }
}

impl Default for ConfigWatcher {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl WatchHandle {
    /// The watched file path, as given to [`ConfigWatcher::watch`].
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the debounce task is still alive.
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop watching.
    pub fn close(self) {
        drop(self);
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("path", &self.path)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        tracing::debug!(path = %self.path.display(), "Config watcher closed");
    }
}
