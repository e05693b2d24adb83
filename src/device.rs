//! The device registry that owns live peers.
//!
//! The protocol engine behind the registry is outside this crate; the
//! reconcilers only need upsert, removal and an options switch. [`PeerTable`]
//! is a plain in-memory registry for embedders that keep peer state here.

use crate::error::Result;
use crate::model::Peer;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Runtime switches pushed from the base configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceOptions {
    /// Accept agents that are not listed in the agent peer file.
    pub disable_agent_validation: bool,
}

/// Registry of peers the server will talk to.
///
/// Implementations must tolerate concurrent calls from the three peer
/// reconcilers.
pub trait Device: Send + Sync {
    /// Insert a peer, or update it if its identity is already registered.
    fn add_peer(&self, peer: Peer) -> Result<()>;

    /// Remove the peer with this identity. Removing an unknown identity is not
    /// an error.
    fn remove_peer(&self, identity: &str) -> Result<()>;

    /// Apply new runtime options.
    fn set_options(&self, options: DeviceOptions);
}

/// In-memory [`Device`] keyed by peer identity.
#[derive(Debug, Default)]
pub struct PeerTable {
    peers: RwLock<HashMap<String, Peer>>,
    options: RwLock<DeviceOptions>,
}

impl PeerTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a peer by identity.
    pub fn get(&self, identity: &str) -> Option<Peer> {
        self.peers.read().get(identity).cloned()
    }

    /// Number of registered peers across all categories.
    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    /// Whether no peers are registered.
    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }

    /// Current options.
    pub fn options(&self) -> DeviceOptions {
        *self.options.read()
    }
}

impl Device for PeerTable {
    fn add_peer(&self, peer: Peer) -> Result<()> {
        self.peers.write().insert(peer.identity().to_string(), peer);
        Ok(())
    }

    fn remove_peer(&self, identity: &str) -> Result<()> {
        self.peers.write().remove(identity);
        Ok(())
    }

    fn set_options(&self, options: DeviceOptions) {
        *self.options.write() = options;
    }
}
