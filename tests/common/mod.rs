//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use hotswap_reconcile::device::{Device, DeviceOptions, PeerTable};
use hotswap_reconcile::domain::Domain;
use hotswap_reconcile::error::{ConfigError, Result};
use hotswap_reconcile::frontend::{FrontendFactory, HttpFrontend};
use hotswap_reconcile::model::{HttpConfig, Peer};
use hotswap_reconcile::plugin::{PluginHandler, PluginLoader};
use parking_lot::Mutex;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tempfile::TempDir;

/// A registry call seen by [`RecordingDevice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceOp {
    Add(String),
    Remove(String),
}

/// Device that records every call and can be told to panic.
#[derive(Default)]
pub struct RecordingDevice {
    pub table: PeerTable,
    ops: Mutex<Vec<DeviceOp>>,
    options: Mutex<Vec<DeviceOptions>>,
    panic_on_add: AtomicBool,
}

impl RecordingDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Drain the recorded operations.
    pub fn take_ops(&self) -> Vec<DeviceOp> {
        std::mem::take(&mut *self.ops.lock())
    }

    pub fn options_pushed(&self) -> Vec<DeviceOptions> {
        self.options.lock().clone()
    }

    pub fn set_panic_on_add(&self, panic: bool) {
        self.panic_on_add.store(panic, Ordering::SeqCst);
    }
}

impl Device for RecordingDevice {
    fn add_peer(&self, peer: Peer) -> Result<()> {
        if self.panic_on_add.load(Ordering::SeqCst) {
            panic!("device exploded while adding {}", peer.identity());
        }
        self.ops.lock().push(DeviceOp::Add(peer.identity().to_string()));
        self.table.add_peer(peer)
    }

    fn remove_peer(&self, identity: &str) -> Result<()> {
        self.ops.lock().push(DeviceOp::Remove(identity.to_string()));
        self.table.remove_peer(identity)
    }

    fn set_options(&self, options: DeviceOptions) {
        self.options.lock().push(options);
        self.table.set_options(options);
    }
}

/// Counters shared by every [`FakeFrontend`] a probe's factory creates.
#[derive(Clone, Default)]
pub struct FrontendProbe {
    pub starts: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
    pub fail_start: Arc<AtomicBool>,
}

impl FrontendProbe {
    pub fn factory(&self) -> FrontendFactory {
        let probe = self.clone();
        Arc::new(move || {
            Arc::new(FakeFrontend {
                probe: probe.clone(),
                running: AtomicBool::new(false),
            }) as Arc<dyn HttpFrontend>
        })
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

pub struct FakeFrontend {
    probe: FrontendProbe,
    running: AtomicBool,
}

#[async_trait]
impl HttpFrontend for FakeFrontend {
    async fn start(&self, _config: &HttpConfig) -> std::io::Result<()> {
        if self.probe.fail_start.load(Ordering::SeqCst) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                "address already in use",
            ));
        }
        self.probe.starts.fetch_add(1, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) {
        self.probe.stops.fetch_add(1, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct NamedHandler(String);

impl PluginHandler for NamedHandler {
    fn name(&self) -> &str {
        &self.0
    }
}

/// Loads any path containing "good" and rejects everything else.
pub struct SelectiveLoader;

impl PluginLoader for SelectiveLoader {
    fn read_handler(&self, path: &str) -> Result<Arc<dyn PluginHandler>> {
        if path.contains("good") {
            Ok(Arc::new(NamedHandler(path.to_string())))
        } else {
            Err(ConfigError::Plugin(format!("cannot open {}", path)))
        }
    }
}

/// A temporary configuration directory.
pub struct ConfigDir {
    pub dir: TempDir,
}

impl ConfigDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self, domain: Domain) -> PathBuf {
        self.dir.path().join(domain.default_file_name())
    }

    pub fn write(&self, domain: Domain, content: &str) {
        fs::write(self.path(domain), content).unwrap();
    }

    pub fn remove(&self, domain: Domain) {
        fs::remove_file(self.path(domain)).unwrap();
    }
}

/// A peer file listing `ids` under `array`, one address per peer.
pub fn peer_file(array: &str, ids: &[&str]) -> String {
    ids.iter()
        .enumerate()
        .map(|(i, id)| {
            format!(
                "[[{}]]\nPubKeyBase64 = \"{}\"\nIp = \"10.0.0.{}\"\nPort = 51820\n",
                array,
                id,
                i + 1
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
