//! Field-by-field application of the base settings.

use crate::core::ConfigStore;
use crate::device::{Device, DeviceOptions};
use crate::model::BaseConfig;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;

/// Callback that adjusts process log verbosity.
pub type LogLevelHook = Arc<dyn Fn(LevelFilter) + Send + Sync>;

/// Side effects triggered by one base-config application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseChanges {
    /// First application: every side effect ran.
    pub initial: bool,
    /// The log level changed and the hook was called.
    pub log_level: bool,
    /// Agent validation toggled and device options were pushed.
    pub agent_validation: bool,
    /// The default cipher scheme changed.
    pub cipher_scheme: bool,
    /// Fields that differ but only take effect after a restart.
    pub restart_required: Vec<&'static str>,
}

/// Applies base settings to the running server.
///
/// The first value is taken whole. Later values only move the hot fields;
/// identity and listen fields keep their running values and are reported in
/// [`BaseChanges::restart_required`].
pub struct BaseConfigReconciler {
    store: ConfigStore<BaseConfig>,
    /// Held for the whole of `apply`, so applies never interleave. The flag
    /// is set once the first value has been taken whole.
    initialized: Mutex<bool>,
    log_hook: Option<LogLevelHook>,
}

impl BaseConfigReconciler {
    /// Create a reconciler committing into `store`.
    pub fn new(store: ConfigStore<BaseConfig>, log_hook: Option<LogLevelHook>) -> Self {
        Self {
            store,
            initialized: Mutex::new(false),
            log_hook,
        }
    }

    /// Apply `incoming` and commit the resulting configuration.
    pub fn apply(&self, device: &dyn Device, incoming: BaseConfig) -> BaseChanges {
        let mut initialized = self.initialized.lock();

        if !*initialized {
            self.set_log_level(incoming.level_filter());
            device.set_options(DeviceOptions {
                disable_agent_validation: incoming.disable_agent_validation,
            });
            tracing::info!(
                hostname = %incoming.hostname,
                listen_ip = %incoming.listen_ip,
                listen_port = incoming.listen_port,
                "Base config loaded"
            );
            self.store.replace(incoming);
            *initialized = true;
            return BaseChanges {
                initial: true,
                log_level: true,
                agent_validation: true,
                cipher_scheme: true,
                restart_required: Vec::new(),
            };
        }

        let running = self.store.get();
        let mut next = (*running).clone();
        let mut changes = BaseChanges::default();

        if running.log_level != incoming.log_level {
            tracing::info!(level = incoming.log_level, "Set base log level");
            self.set_log_level(incoming.level_filter());
            next.log_level = incoming.log_level;
            changes.log_level = true;
        }

        if running.disable_agent_validation != incoming.disable_agent_validation {
            tracing::info!(disabled = incoming.disable_agent_validation, "Set agent peer validation");
            device.set_options(DeviceOptions {
                disable_agent_validation: incoming.disable_agent_validation,
            });
            next.disable_agent_validation = incoming.disable_agent_validation;
            changes.agent_validation = true;
        }

        if running.default_cipher_scheme != incoming.default_cipher_scheme {
            tracing::info!(scheme = incoming.default_cipher_scheme, "Set default cipher scheme");
            next.default_cipher_scheme = incoming.default_cipher_scheme;
            changes.cipher_scheme = true;
        }

        changes.restart_required = running.restart_fields_differ(&incoming);
        if !changes.restart_required.is_empty() {
            tracing::warn!(fields = ?changes.restart_required, "Base config fields changed; restart required to apply");
        }

        if changes.log_level || changes.agent_validation || changes.cipher_scheme {
            self.store.replace(next);
        }
        changes
    }

    /// Last applied base configuration.
    pub fn config(&self) -> Arc<BaseConfig> {
        self.store.get()
    }

    fn set_log_level(&self, level: LevelFilter) {
        if let Some(hook) = &self.log_hook {
            hook(level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::PeerTable;

    fn reconciler() -> (BaseConfigReconciler, Arc<Mutex<Vec<LevelFilter>>>) {
        let levels = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&levels);
        let hook: LogLevelHook = Arc::new(move |level| sink.lock().push(level));
        (BaseConfigReconciler::new(ConfigStore::default(), Some(hook)), levels)
    }

    fn base(log_level: i32, port: u16) -> BaseConfig {
        BaseConfig {
            log_level,
            listen_port: port,
            ..Default::default()
        }
    }

    #[test]
    fn test_first_apply_takes_everything() {
        let (reconciler, levels) = reconciler();
        let device = PeerTable::new();
        let changes = reconciler.apply(
            &device,
            BaseConfig {
                disable_agent_validation: true,
                ..base(3, 62206)
            },
        );

        assert!(changes.initial);
        assert_eq!(*levels.lock(), vec![LevelFilter::INFO]);
        assert!(device.options().disable_agent_validation);
        assert_eq!(reconciler.config().listen_port, 62206);
    }

    #[test]
    fn test_only_changed_fields_trigger_side_effects() {
        let (reconciler, levels) = reconciler();
        let device = PeerTable::new();
        reconciler.apply(&device, base(3, 62206));
        levels.lock().clear();

        let unchanged = reconciler.apply(&device, base(3, 62206));
        assert_eq!(unchanged, BaseChanges::default());
        assert!(levels.lock().is_empty());

        let changed = reconciler.apply(&device, base(4, 62206));
        assert!(changed.log_level);
        assert!(!changed.agent_validation);
        assert_eq!(*levels.lock(), vec![LevelFilter::DEBUG]);
        assert_eq!(reconciler.config().log_level, 4);
    }

    #[test]
    fn test_restart_fields_keep_running_value() {
        let (reconciler, _levels) = reconciler();
        let device = PeerTable::new();
        reconciler.apply(&device, base(3, 62206));

        let changes = reconciler.apply(
            &device,
            BaseConfig {
                default_cipher_scheme: 1,
                ..base(3, 9000)
            },
        );

        assert_eq!(changes.restart_required, vec!["ListenPort"]);
        assert!(changes.cipher_scheme);
        assert_eq!(reconciler.config().listen_port, 62206);
        assert_eq!(reconciler.config().default_cipher_scheme, 1);
    }

    #[test]
    fn test_agent_validation_toggle_reaches_device() {
        let (reconciler, _levels) = reconciler();
        let device = PeerTable::new();
        reconciler.apply(&device, base(3, 1));
        reconciler.apply(
            &device,
            BaseConfig {
                disable_agent_validation: true,
                ..base(3, 1)
            },
        );
        assert!(device.options().disable_agent_validation);
    }
}
