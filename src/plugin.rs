//! Authorization-service plugins.

use crate::error::{ConfigError, Result};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// A loaded plugin. What it does with requests is up to the embedder.
pub trait PluginHandler: Send + Sync + fmt::Debug {
    /// Name reported by the plugin.
    fn name(&self) -> &str;
}

/// Loads plugin handlers from the paths named in the resource file.
pub trait PluginLoader: Send + Sync {
    /// Load the plugin at `path`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Plugin` when the plugin cannot be loaded.
    fn read_handler(&self, path: &str) -> Result<Arc<dyn PluginHandler>>;
}

/// Loader used when the embedder did not configure one. Every load fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPluginLoader;

impl PluginLoader for NoPluginLoader {
    fn read_handler(&self, path: &str) -> Result<Arc<dyn PluginHandler>> {
        Err(ConfigError::Plugin(format!(
            "no plugin loader configured, cannot load {}",
            path
        )))
    }
}

/// Server-held table of loaded plugins keyed by provider id.
#[derive(Default)]
pub struct PluginTable {
    plugins: RwLock<HashMap<String, Arc<dyn PluginHandler>>>,
}

impl PluginTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for provider `id`, returning the handler it replaced.
    pub fn load_plugin(
        &self,
        id: impl Into<String>,
        handler: Arc<dyn PluginHandler>,
    ) -> Option<Arc<dyn PluginHandler>> {
        self.plugins.write().insert(id.into(), handler)
    }

    /// Drop every handler whose provider id is not in `keep`. Returns the
    /// number of handlers removed.
    pub fn retain_providers(&self, keep: &HashSet<String>) -> usize {
        let mut plugins = self.plugins.write();
        let before = plugins.len();
        plugins.retain(|id, _| keep.contains(id));
        before - plugins.len()
    }

    /// Handler registered for provider `id`.
    pub fn get(&self, id: &str) -> Option<Arc<dyn PluginHandler>> {
        self.plugins.read().get(id).cloned()
    }

    /// Number of registered plugins.
    pub fn len(&self) -> usize {
        self.plugins.read().len()
    }

    /// Whether no plugins are registered.
    pub fn is_empty(&self) -> bool {
        self.plugins.read().is_empty()
    }
}

impl fmt::Debug for PluginTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plugins = self.plugins.read();
        let mut ids: Vec<_> = plugins.keys().collect();
        ids.sort();
        f.debug_struct("PluginTable").field("providers", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Named(&'static str);

    impl PluginHandler for Named {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_load_replaces_previous() {
        let table = PluginTable::new();
        assert!(table.load_plugin("oidc", Arc::new(Named("v1"))).is_none());
        let old = table.load_plugin("oidc", Arc::new(Named("v2"))).unwrap();

        assert_eq!(old.name(), "v1");
        assert_eq!(table.get("oidc").unwrap().name(), "v2");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_retain_providers() {
        let table = PluginTable::new();
        table.load_plugin("oidc", Arc::new(Named("oidc")));
        table.load_plugin("ldap", Arc::new(Named("ldap")));

        let removed = table.retain_providers(&HashSet::from(["oidc".to_string()]));
        assert_eq!(removed, 1);
        assert!(table.get("ldap").is_none());
        assert!(table.get("oidc").is_some());
    }

    #[test]
    fn test_no_loader_fails() {
        let err = NoPluginLoader.read_handler("plugins/x.so").unwrap_err();
        assert!(err.to_string().contains("plugins/x.so"));
    }
}
