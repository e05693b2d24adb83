//! Start/stop state machine for the optional HTTP front-end.

use crate::core::ConfigStore;
use crate::domain::Domain;
use crate::error::{ConfigError, Result};
use crate::frontend::{FrontendFactory, HttpFrontend};
use crate::model::HttpConfig;
use std::sync::Arc;
use tokio::sync::Mutex;

/// What [`ServiceLifecycleManager::apply`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    /// A new front-end instance was started.
    Started,
    /// The running instance was detached and is stopping in the background.
    Stopped,
    /// The desired state already held.
    Unchanged,
}

/// Keeps the HTTP front-end in line with `EnableHttp`.
///
/// Transitions are idempotent: enabling while running and disabling while
/// stopped do nothing. Starting is awaited so bind failures reach the caller;
/// stopping runs on a spawned task and the live reference is cleared first,
/// so a slow shutdown never makes a later reload think the old instance is
/// still serving.
pub struct ServiceLifecycleManager {
    factory: Option<FrontendFactory>,
    current: Mutex<Option<Arc<dyn HttpFrontend>>>,
    config: ConfigStore<HttpConfig>,
}

impl ServiceLifecycleManager {
    /// Create a manager. Without a factory, enabling HTTP is an apply error.
    pub fn new(factory: Option<FrontendFactory>, config: ConfigStore<HttpConfig>) -> Self {
        Self {
            factory,
            current: Mutex::new(None),
            config,
        }
    }

    /// Apply a freshly parsed HTTP configuration.
    ///
    /// Zero timeouts are replaced with their defaults before anything starts.
    /// The stored configuration is only replaced when the apply succeeds.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Apply` when a new instance fails to start (for
    /// example because the port is already in use). No instance is retained in
    /// that case, so the next reload tries again.
    pub async fn apply(&self, config: HttpConfig) -> Result<LifecycleAction> {
        let config = config.with_defaults();
        let mut current = self.current.lock().await;

        let action = if config.enable_http {
            if current.as_ref().is_some_and(|server| server.is_running()) {
                LifecycleAction::Unchanged
            } else {
                if let Some(stale) = current.take() {
                    stop_detached(stale);
                }
                let factory = self.factory.as_ref().ok_or_else(|| ConfigError::Apply {
                    domain: Domain::Http,
                    reason: "HTTP is enabled but no front-end is configured".to_string(),
                })?;
                let server = factory();
                server.start(&config).await.map_err(|e| ConfigError::Apply {
                    domain: Domain::Http,
                    reason: format!("failed to start HTTP front-end on {}: {}", config.listen_addr(), e),
                })?;
                *current = Some(server);
                LifecycleAction::Started
            }
        } else if let Some(server) = current.take_if(|server| server.is_running()) {
            stop_detached(server);
            LifecycleAction::Stopped
        } else {
            LifecycleAction::Unchanged
        };

        drop(current);
        self.config.replace(config);
        Ok(action)
    }

    /// Whether a front-end instance is currently serving.
    pub async fn is_running(&self) -> bool {
        self.current
            .lock()
            .await
            .as_ref()
            .is_some_and(|server| server.is_running())
    }

    /// Stop the current instance, if any, and wait for it to finish.
    pub async fn shutdown(&self) {
        let server = self.current.lock().await.take();
        if let Some(server) = server {
            server.stop().await;
        }
    }

    /// Last applied HTTP configuration.
    pub fn config(&self) -> Arc<HttpConfig> {
        self.config.get()
    }
}

fn stop_detached(server: Arc<dyn HttpFrontend>) {
    tokio::spawn(async move {
        server.stop().await;
    });
}
