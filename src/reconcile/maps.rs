//! Wholesale replacement of shared lookup maps.

use crate::model::{AuthServiceFile, AuthServiceMap, AuthServiceProvider, NetAddress, SourceIpMap};
use crate::plugin::{PluginLoader, PluginTable};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

/// A shared string-keyed map that is only ever replaced as a whole.
///
/// There is no partial update: [`MapStore::replace`] swaps the map under the
/// write guard, so a reader holding the read guard sees either the complete
/// old map or the complete new one. Entries missing from the new map simply
/// vanish with the swap.
#[derive(Debug)]
pub struct MapStore<V> {
    inner: RwLock<HashMap<String, V>>,
}

impl<V> MapStore<V> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Swap in `map`, returning the map it replaced.
    pub fn replace(&self, map: HashMap<String, V>) -> HashMap<String, V> {
        std::mem::replace(&mut *self.inner.write(), map)
    }

    /// Run `f` against the current map under the read guard.
    pub fn with<R>(&self, f: impl FnOnce(&HashMap<String, V>) -> R) -> R {
        f(&self.inner.read())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }
}

impl<V: Clone> MapStore<V> {
    /// Clone of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.read().get(key).cloned()
    }

    /// Clone of the whole map.
    pub fn snapshot(&self) -> HashMap<String, V> {
        self.inner.read().clone()
    }
}

impl<V> Default for MapStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace the source-IP association map.
pub fn reconcile_source_ips(store: &MapStore<Vec<NetAddress>>, map: SourceIpMap) {
    let entries = map.len();
    let previous = store.replace(map);
    tracing::info!(entries, previous = previous.len(), "Source IP associations replaced");
}

/// Builds authorization-service providers from the resource file and swaps
/// them into the live map.
pub struct AuthServiceReconciler<'a> {
    loader: &'a dyn PluginLoader,
    plugins: &'a PluginTable,
}

impl<'a> AuthServiceReconciler<'a> {
    /// Reconciler that loads plugins through `loader` into `plugins`.
    pub fn new(loader: &'a dyn PluginLoader, plugins: &'a PluginTable) -> Self {
        Self { loader, plugins }
    }

    /// Populate every provider and resource group with its ids, load declared
    /// plugins, then replace `store` with the result.
    ///
    /// A plugin that fails to load is logged; its provider is still part of
    /// the new map. Handlers of providers that no longer load a plugin are
    /// dropped from the plugin table. Returns the number of plugins loaded.
    pub fn reconcile(
        &self,
        store: &MapStore<AuthServiceProvider>,
        file: AuthServiceFile,
    ) -> usize {
        let mut map: AuthServiceMap = HashMap::with_capacity(file.len());
        let mut loaded = HashSet::new();

        for (id, spec) in file {
            let provider = spec.into_provider(&id);
            if let Some(path) = provider.plugin_path.as_deref() {
                match self.loader.read_handler(path) {
                    Ok(handler) => {
                        tracing::info!(provider = %id, plugin = %path, name = handler.name(), "Plugin loaded");
                        self.plugins.load_plugin(id.clone(), handler);
                        loaded.insert(id.clone());
                    }
                    Err(e) => {
                        tracing::error!(provider = %id, plugin = %path, error = %e, "Failed to load plugin");
                    }
                }
            }
            map.insert(id, provider);
        }

        let providers = map.len();
        store.replace(map);
        let unloaded = self.plugins.retain_providers(&loaded);
        tracing::info!(providers, plugins = loaded.len(), unloaded, "Authorization services replaced");
        loaded.len()
    }
}
