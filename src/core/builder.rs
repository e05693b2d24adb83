//! Builder for constructing a [`ReconciliationCoordinator`].

use crate::core::ConfigStore;
use crate::core::coordinator::{Inner, ReconciliationCoordinator};
use crate::core::loader::{DomainLoader, FailurePolicy};
use crate::device::Device;
use crate::domain::Domain;
use crate::error::{ConfigError, Result};
use crate::frontend::FrontendFactory;
use crate::model::PeerCategory;
use crate::notify::ReloadListeners;
use crate::plugin::{NoPluginLoader, PluginLoader, PluginTable};
use crate::reconcile::{
    BaseConfigReconciler, LogLevelHook, MapStore, PeerReconciler, ServiceLifecycleManager,
};
use crate::sources::{ConfigSource, FileSource, Format};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "file-watch")]
use crate::notify::WatchRegistry;

/// Default window in which bursts of file events collapse into one reload.
pub const DEFAULT_WATCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Builder for a [`ReconciliationCoordinator`].
///
/// Only the device registry is required. Domain files default to their
/// standard names inside the configuration directory; any file can be moved
/// with [`with_file`](Self::with_file).
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_reconcile::prelude::*;
/// use hotswap_reconcile::device::PeerTable;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # fn example() -> Result<()> {
/// let coordinator = ReconciliationCoordinator::builder()
///     .with_config_dir("/etc/access")
///     .with_file(Domain::AuthServices, "/etc/access/providers/resource.toml")
///     .with_device(Arc::new(PeerTable::new()))
///     .with_failure_policy(FailurePolicy::PreservePrevious)
///     .with_watch_debounce(Duration::from_millis(250))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct CoordinatorBuilder {
    config_dir: Option<PathBuf>,
    files: BTreeMap<Domain, PathBuf>,
    source: Option<Arc<dyn ConfigSource>>,
    device: Option<Arc<dyn Device>>,
    frontend: Option<FrontendFactory>,
    plugin_loader: Option<Arc<dyn PluginLoader>>,
    policy: FailurePolicy,
    debounce: Duration,
    log_hook: Option<LogLevelHook>,
    #[cfg(feature = "metrics")]
    metrics: Option<crate::metrics::ReconcileMetrics>,
}

impl CoordinatorBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config_dir: None,
            files: BTreeMap::new(),
            source: None,
            device: None,
            frontend: None,
            plugin_loader: None,
            policy: FailurePolicy::default(),
            debounce: DEFAULT_WATCH_DEBOUNCE,
            log_hook: None,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Directory holding the standard domain files.
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(dir.into());
        self
    }

    /// Read `domain` from `path` instead of its standard file.
    ///
    /// The extension selects the format: `.toml`, or `.json` with the `json`
    /// feature.
    pub fn with_file(mut self, domain: Domain, path: impl Into<PathBuf>) -> Self {
        self.files.insert(domain, path.into());
        self
    }

    /// Read domain files through a custom source instead of the file system.
    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Device registry that peers are reconciled into. Required.
    pub fn with_device(mut self, device: Arc<dyn Device>) -> Self {
        self.device = Some(device);
        self
    }

    /// Factory for HTTP front-end instances.
    ///
    /// With the `http-frontend` feature the default serves only `/healthz`.
    pub fn with_http_frontend(mut self, factory: FrontendFactory) -> Self {
        self.frontend = Some(factory);
        self
    }

    /// Loader for authorization-service plugins. Without one, every declared
    /// plugin fails to load and is logged.
    pub fn with_plugin_loader(mut self, loader: Arc<dyn PluginLoader>) -> Self {
        self.plugin_loader = Some(loader);
        self
    }

    /// What to apply when a domain file cannot be read or parsed.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Debounce window for file watches.
    pub fn with_watch_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Callback invoked when the base config changes the log level.
    pub fn with_log_level_hook(mut self, hook: LogLevelHook) -> Self {
        self.log_hook = Some(hook);
        self
    }

    /// Record reload metrics on `meter`.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: opentelemetry::metrics::Meter) -> Self {
        self.metrics = Some(crate::metrics::ReconcileMetrics::new(meter));
        self
    }

    /// Build the coordinator. Nothing is read until
    /// [`ReconciliationCoordinator::start`] or
    /// [`ReconciliationCoordinator::reload`] runs.
    ///
    /// # Errors
    ///
    /// Returns an error if no device was given, if a domain has neither an
    /// explicit file nor a configuration directory, or if a file extension has
    /// no known format.
    pub fn build(self) -> Result<ReconciliationCoordinator> {
        let device = self
            .device
            .ok_or_else(|| ConfigError::Other("a device registry is required".to_string()))?;

        let mut paths = BTreeMap::new();
        for domain in Domain::ALL {
            let path = match (self.files.get(&domain), &self.config_dir) {
                (Some(path), _) => path.clone(),
                (None, Some(dir)) => dir.join(domain.default_file_name()),
                (None, None) => {
                    return Err(ConfigError::Other(format!(
                        "no config directory or file given for the {} domain",
                        domain
                    )));
                }
            };
            Format::from_path(&path)?;
            paths.insert(domain, path);
        }

        let source = self
            .source
            .unwrap_or_else(|| Arc::new(FileSource::new()));

        #[cfg(feature = "http-frontend")]
        let frontend = self
            .frontend
            .or_else(|| Some(crate::frontend::AxumFrontend::factory(axum::Router::new())));
        #[cfg(not(feature = "http-frontend"))]
        let frontend = self.frontend;

        let inner = Inner {
            paths,
            loader: DomainLoader::new(source, self.policy),
            device,
            plugin_loader: self
                .plugin_loader
                .unwrap_or_else(|| Arc::new(NoPluginLoader)),
            plugins: PluginTable::new(),
            base: BaseConfigReconciler::new(ConfigStore::default(), self.log_hook),
            http: ServiceLifecycleManager::new(frontend, ConfigStore::default()),
            consoles: PeerReconciler::new(PeerCategory::Console),
            agents: PeerReconciler::new(PeerCategory::Agent),
            resource_dbs: PeerReconciler::new(PeerCategory::ResourceDb),
            auth_services: MapStore::new(),
            source_ips: MapStore::new(),
            listeners: ReloadListeners::new(),
            #[cfg(feature = "file-watch")]
            watches: WatchRegistry::new(self.debounce),
            #[cfg(feature = "metrics")]
            metrics: self.metrics,
        };

        #[cfg(not(feature = "file-watch"))]
        let _ = self.debounce;

        Ok(ReconciliationCoordinator::from_inner(inner))
    }
}

impl Default for CoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::PeerTable;

    #[test]
    fn test_builder_requires_device() {
        let result = CoordinatorBuilder::new().with_config_dir("/tmp").build();
        assert!(matches!(result, Err(ConfigError::Other(_))));
    }

    #[test]
    fn test_builder_requires_paths() {
        let result = CoordinatorBuilder::new()
            .with_device(Arc::new(PeerTable::new()))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_files_without_dir() {
        let mut builder = CoordinatorBuilder::new().with_device(Arc::new(PeerTable::new()));
        for domain in Domain::ALL {
            builder = builder.with_file(domain, format!("/srv/{}", domain.default_file_name()));
        }
        let coordinator = builder.build().unwrap();
        assert_eq!(
            coordinator.path(Domain::Base),
            std::path::Path::new("/srv/config.toml")
        );
    }

    #[test]
    fn test_file_override_wins() {
        let coordinator = CoordinatorBuilder::new()
            .with_config_dir("/etc/access")
            .with_file(Domain::SourceIps, "/var/lib/access/srcip.toml")
            .with_device(Arc::new(PeerTable::new()))
            .build()
            .unwrap();
        assert_eq!(
            coordinator.path(Domain::SourceIps),
            std::path::Path::new("/var/lib/access/srcip.toml")
        );
        assert_eq!(
            coordinator.path(Domain::Http),
            std::path::Path::new("/etc/access/http.toml")
        );
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        let result = CoordinatorBuilder::new()
            .with_config_dir("/etc/access")
            .with_file(Domain::Base, "/etc/access/config.ini")
            .with_device(Arc::new(PeerTable::new()))
            .build();
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_default_debounce() {
        let builder = CoordinatorBuilder::default();
        assert_eq!(builder.debounce, DEFAULT_WATCH_DEBOUNCE);
        assert_eq!(builder.policy, FailurePolicy::ApplyZeroValue);
    }
}
