//! The reconciliation coordinator: read, parse, reconcile and commit, one
//! domain at a time.

use crate::core::builder::CoordinatorBuilder;
use crate::core::loader::{DomainLoader, FailurePolicy, Loaded};
use crate::device::Device;
use crate::domain::Domain;
use crate::error::{ConfigError, Result};
use crate::model::{
    AuthServiceFile, AuthServiceProvider, BaseConfig, HttpConfig, NetAddress, PeerCategory,
    PeerFile, SourceIpMap,
};
use crate::notify::{ReloadListeners, SubscriptionHandle};
use crate::plugin::{PluginLoader, PluginTable};
use crate::reconcile::{
    AuthServiceReconciler, BaseConfigReconciler, LifecycleAction, MapStore, PeerReconciler,
    ServiceLifecycleManager, reconcile_source_ips,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(feature = "file-watch")]
use crate::notify::WatchRegistry;

#[cfg(feature = "metrics")]
use crate::metrics::ReconcileMetrics;

/// Drives every configuration domain from its file to live server state.
///
/// Each [`reload`](Self::reload) runs on its own Tokio task. A panic anywhere
/// in the read, parse or apply steps is caught at that task boundary and
/// reported as [`ConfigError::LoadFault`]; the coordinator and every other
/// domain keep working.
///
/// Cloning is cheap and every clone drives the same state.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_reconcile::prelude::*;
/// use hotswap_reconcile::device::PeerTable;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<()> {
/// let coordinator = ReconciliationCoordinator::builder()
///     .with_config_dir("/etc/access")
///     .with_device(Arc::new(PeerTable::new()))
///     .build()?;
///
/// // Load every domain, then watch every file.
/// coordinator.start().await?;
///
/// // Reload one domain by hand.
/// coordinator.reload(Domain::AgentPeers).await?;
///
/// coordinator.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ReconciliationCoordinator {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    pub(crate) paths: BTreeMap<Domain, PathBuf>,
    pub(crate) loader: DomainLoader,
    pub(crate) device: Arc<dyn Device>,
    pub(crate) plugin_loader: Arc<dyn PluginLoader>,
    pub(crate) plugins: PluginTable,
    pub(crate) base: BaseConfigReconciler,
    pub(crate) http: ServiceLifecycleManager,
    pub(crate) consoles: PeerReconciler,
    pub(crate) agents: PeerReconciler,
    pub(crate) resource_dbs: PeerReconciler,
    pub(crate) auth_services: MapStore<AuthServiceProvider>,
    pub(crate) source_ips: MapStore<Vec<NetAddress>>,
    pub(crate) listeners: ReloadListeners,
    #[cfg(feature = "file-watch")]
    pub(crate) watches: WatchRegistry,
    #[cfg(feature = "metrics")]
    pub(crate) metrics: Option<ReconcileMetrics>,
}

impl ReconciliationCoordinator {
    /// Create a builder.
    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::new()
    }

    pub(crate) fn from_inner(inner: Inner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Load every domain once, base first, then watch every domain file.
    ///
    /// # Errors
    ///
    /// A base-domain failure is fatal and returned before anything else loads.
    /// Failures in other domains are logged and startup continues.
    pub async fn start(&self) -> Result<()> {
        for domain in Domain::ALL {
            match self.reload(domain).await {
                Ok(()) => {}
                Err(e) if domain == Domain::Base => {
                    tracing::error!(error = %e, "Failed to load base config");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(domain = %domain, error = %e, "Startup load incomplete");
                }
            }
        }

        #[cfg(feature = "file-watch")]
        self.watch_all();

        tracing::info!(source = %self.inner.loader.source_name(), "Config reconciliation started");
        Ok(())
    }

    /// Reload one domain behind the fault barrier.
    ///
    /// With [`FailurePolicy::ApplyZeroValue`] a read or parse failure still
    /// applies the zero value before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns the read or parse failure, otherwise the apply failure, or
    /// `LoadFault` if the reload panicked.
    pub async fn reload(&self, domain: Domain) -> Result<()> {
        #[cfg(feature = "metrics")]
        let timer = self.inner.metrics.as_ref().map(|m| m.start_reload(domain));

        let inner = Arc::clone(&self.inner);
        let result = match tokio::spawn(async move { inner.reload_domain(domain).await }).await {
            Ok(result) => result,
            Err(join_error) => {
                tracing::error!(domain = %domain, error = %join_error, "Config reload aborted");
                #[cfg(feature = "metrics")]
                if let Some(metrics) = &self.inner.metrics {
                    metrics.record_reload_fault(domain);
                }
                Err(ConfigError::LoadFault { domain })
            }
        };

        #[cfg(feature = "metrics")]
        if let (Some(metrics), Some(timer)) = (&self.inner.metrics, timer) {
            match &result {
                Ok(()) => metrics.record_reload_success(domain, timer),
                Err(_) => metrics.record_reload_failure(domain, timer),
            }
        }

        result
    }

    /// Register a debounced watch on every domain file, replacing any
    /// existing watches. Returns the number of active watches.
    ///
    /// Must be called from within a Tokio runtime.
    #[cfg(feature = "file-watch")]
    pub fn watch_all(&self) -> usize {
        let weak = Arc::downgrade(&self.inner);
        let targets: Vec<_> = self
            .inner
            .paths
            .iter()
            .map(|(domain, path)| (*domain, path.clone()))
            .collect();

        self.inner.watches.start_all(targets, move |domain| {
            let weak = weak.clone();
            async move {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                tracing::info!(domain = %domain, "Config file changed, reloading");
                if let Err(e) = (ReconciliationCoordinator { inner }).reload(domain).await {
                    tracing::debug!(domain = %domain, error = %e, "Reload finished with error");
                }
            }
        })
    }

    /// Close every file watch. Reloads already running are left to finish.
    pub fn stop_watching(&self) {
        #[cfg(feature = "file-watch")]
        self.inner.watches.stop_all();
    }

    /// Close every watch and stop the HTTP front-end, waiting for it to drain.
    pub async fn shutdown(&self) {
        self.stop_watching();
        self.inner.http.shutdown().await;
        tracing::info!("Config reconciliation stopped");
    }

    /// Run `callback` after every reload that applied a value.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(Domain) + Send + Sync + 'static,
    {
        self.inner.listeners.subscribe(callback)
    }

    /// Path of the file backing `domain`.
    pub fn path(&self, domain: Domain) -> &Path {
        self.inner.path(domain)
    }

    /// The policy applied to unreadable or malformed files.
    pub fn failure_policy(&self) -> FailurePolicy {
        self.inner.loader.policy()
    }

    /// Running base configuration.
    pub fn base_config(&self) -> Arc<BaseConfig> {
        self.inner.base.config()
    }

    /// Last successfully applied HTTP configuration.
    pub fn http_config(&self) -> Arc<HttpConfig> {
        self.inner.http.config()
    }

    /// Whether the HTTP front-end is serving.
    pub async fn is_http_running(&self) -> bool {
        self.inner.http.is_running().await
    }

    /// Live peer map of one category.
    pub fn peers(&self, category: PeerCategory) -> &PeerReconciler {
        self.inner.peers(category)
    }

    /// Live authorization-service map.
    pub fn auth_services(&self) -> &MapStore<AuthServiceProvider> {
        &self.inner.auth_services
    }

    /// Live source-IP association map.
    pub fn source_ips(&self) -> &MapStore<Vec<NetAddress>> {
        &self.inner.source_ips
    }

    /// Plugins loaded for authorization services.
    pub fn plugins(&self) -> &PluginTable {
        &self.inner.plugins
    }

    /// The device registry peers are reconciled into.
    pub fn device(&self) -> &Arc<dyn Device> {
        &self.inner.device
    }
}

impl std::fmt::Debug for ReconciliationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationCoordinator")
            .field("paths", &self.inner.paths)
            .field("policy", &self.inner.loader.policy())
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn path(&self, domain: Domain) -> &Path {
        // Every domain gets a path in CoordinatorBuilder::build.
        self.paths
            .get(&domain)
            .map(PathBuf::as_path)
            .unwrap_or_else(|| Path::new(domain.default_file_name()))
    }

    fn peers(&self, category: PeerCategory) -> &PeerReconciler {
        match category {
            PeerCategory::Console => &self.consoles,
            PeerCategory::Agent => &self.agents,
            PeerCategory::ResourceDb => &self.resource_dbs,
        }
    }

    async fn reload_domain(&self, domain: Domain) -> Result<()> {
        let path = self.path(domain);
        tracing::debug!(domain = %domain, path = %path.display(), "Reloading config");

        let mut applied = false;
        let mut apply_error = None;

        let input_error = match domain {
            Domain::Base => {
                let Loaded { value, error } = self.loader.load::<BaseConfig>(domain, path);
                if let Some(config) = value {
                    let changes = self.base.apply(self.device.as_ref(), config);
                    tracing::debug!(?changes, "Base config applied");
                    applied = true;
                }
                error
            }
            Domain::Http => {
                let Loaded { value, error } = self.loader.load::<HttpConfig>(domain, path);
                if let Some(config) = value {
                    match self.http.apply(config).await {
                        Ok(action) => {
                            self.record_http_action(action);
                            applied = true;
                        }
                        Err(e) => {
                            tracing::error!(domain = %domain, error = %e, "Failed to apply HTTP config");
                            apply_error = Some(e);
                        }
                    }
                }
                error
            }
            Domain::ConsolePeers | Domain::AgentPeers | Domain::ResourcePeers => {
                let category = match domain.peer_category() {
                    Some(category) => category,
                    None => return Err(ConfigError::Other(format!("{} is not a peer domain", domain))),
                };
                let Loaded { value, error } = self.loader.load::<PeerFile>(domain, path);
                if let Some(file) = value {
                    let diff = self
                        .peers(category)
                        .reconcile(self.device.as_ref(), file.into_category(category));
                    #[cfg(feature = "metrics")]
                    if let Some(metrics) = &self.metrics {
                        metrics.record_peer_diff(category, &diff);
                    }
                    if diff.failed > 0 {
                        tracing::warn!(category = %category, failed = diff.failed, "Some peers were not applied to the device");
                    }
                    applied = true;
                }
                error
            }
            Domain::AuthServices => {
                let Loaded { value, error } = self.loader.load::<AuthServiceFile>(domain, path);
                if let Some(file) = value {
                    AuthServiceReconciler::new(self.plugin_loader.as_ref(), &self.plugins)
                        .reconcile(&self.auth_services, file);
                    applied = true;
                }
                error
            }
            Domain::SourceIps => {
                let Loaded { value, error } = self.loader.load::<SourceIpMap>(domain, path);
                if let Some(map) = value {
                    reconcile_source_ips(&self.source_ips, map);
                    applied = true;
                }
                error
            }
        };

        if applied {
            self.listeners.notify_all(domain);
        }

        match input_error.or(apply_error) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn record_http_action(&self, action: LifecycleAction) {
        match action {
            LifecycleAction::Started => tracing::info!("HTTP front-end started"),
            LifecycleAction::Stopped => tracing::info!("HTTP front-end stopping"),
            LifecycleAction::Unchanged => {}
        }
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            if action != LifecycleAction::Unchanged {
                metrics.record_http_transition(action == LifecycleAction::Started);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::PeerTable;
    use std::fs;
    use tempfile::TempDir;

    fn setup(dir: &TempDir, policy: FailurePolicy) -> (ReconciliationCoordinator, Arc<PeerTable>) {
        let device = Arc::new(PeerTable::new());
        let coordinator = ReconciliationCoordinator::builder()
            .with_config_dir(dir.path())
            .with_device(device.clone())
            .with_failure_policy(policy)
            .build()
            .unwrap();
        (coordinator, device)
    }

    const AGENTS_AB: &str = r#"
[[Agents]]
PubKeyBase64 = "A"
Ip = "10.0.0.1"
Port = 51820

[[Agents]]
PubKeyBase64 = "B"
Ip = "10.0.0.2"
Port = 51820
"#;

    #[tokio::test]
    async fn test_peer_reload_from_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("agent.toml"), AGENTS_AB).unwrap();
        let (coordinator, device) = setup(&dir, FailurePolicy::default());

        coordinator.reload(Domain::AgentPeers).await.unwrap();
        assert_eq!(coordinator.peers(PeerCategory::Agent).len(), 2);
        assert_eq!(device.len(), 2);
        assert!(coordinator.peers(PeerCategory::Console).is_empty());
    }

    #[tokio::test]
    async fn test_missing_peer_file_clears_category() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agent.toml");
        fs::write(&path, AGENTS_AB).unwrap();
        let (coordinator, device) = setup(&dir, FailurePolicy::ApplyZeroValue);
        coordinator.reload(Domain::AgentPeers).await.unwrap();

        fs::remove_file(&path).unwrap();
        let err = coordinator.reload(Domain::AgentPeers).await.unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(coordinator.peers(PeerCategory::Agent).is_empty());
        assert!(device.is_empty());
    }

    #[tokio::test]
    async fn test_preserve_previous_keeps_peers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agent.toml");
        fs::write(&path, AGENTS_AB).unwrap();
        let (coordinator, device) = setup(&dir, FailurePolicy::PreservePrevious);
        coordinator.reload(Domain::AgentPeers).await.unwrap();

        fs::write(&path, "[[Agents]\nbroken").unwrap();
        let err = coordinator.reload(Domain::AgentPeers).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(coordinator.peers(PeerCategory::Agent).len(), 2);
        assert_eq!(device.len(), 2);
    }

    #[tokio::test]
    async fn test_listeners_see_applied_domains() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("srcip.toml"), "").unwrap();
        let (coordinator, _device) = setup(&dir, FailurePolicy::default());

        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let _handle = coordinator.subscribe(move |domain| seen_clone.lock().push(domain));

        coordinator.reload(Domain::SourceIps).await.unwrap();
        assert_eq!(*seen.lock(), vec![Domain::SourceIps]);
    }

    #[tokio::test]
    async fn test_paths_follow_config_dir() {
        let dir = TempDir::new().unwrap();
        let (coordinator, _device) = setup(&dir, FailurePolicy::default());
        assert_eq!(coordinator.path(Domain::ResourcePeers), dir.path().join("db.toml"));
        assert_eq!(coordinator.failure_policy(), FailurePolicy::ApplyZeroValue);
    }
}
