//! Add/remove diffing of one peer category against the device registry.

use crate::device::Device;
use crate::model::{Peer, PeerCategory};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Outcome of one peer reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerDiff {
    /// Identities that were not registered for this category before.
    pub added: Vec<String>,
    /// Identities present in both snapshots. They are re-registered (an
    /// upsert) but never removed.
    pub kept: usize,
    /// Identities dropped from the file and removed from the registry.
    pub removed: Vec<String>,
    /// Entries ignored because they had no public key.
    pub skipped: usize,
    /// Registry calls that returned an error.
    pub failed: usize,
}

impl PeerDiff {
    /// Whether the pass changed the set of identities.
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Live peer map of one category.
///
/// Each category has its own instance and its own lock, so reconciling agents
/// never waits on a console reload. Readers on the protocol path take the same
/// lock through [`PeerReconciler::get`] and friends.
#[derive(Debug)]
pub struct PeerReconciler {
    category: PeerCategory,
    current: Mutex<HashMap<String, Peer>>,
}

impl PeerReconciler {
    /// Create an empty reconciler for `category`.
    pub fn new(category: PeerCategory) -> Self {
        Self {
            category,
            current: Mutex::new(HashMap::new()),
        }
    }

    /// The category this reconciler owns.
    pub fn category(&self) -> PeerCategory {
        self.category
    }

    /// Bring the registry in line with `peers`.
    ///
    /// Every listed peer is stamped with this category and registered (new
    /// identities are inserted, known ones updated). Afterwards each identity
    /// of the previous snapshot that is missing from `peers` is removed from
    /// the registry exactly once, and `peers` becomes the stored snapshot.
    /// Registry failures are logged per entry and do not stop the pass.
    pub fn reconcile(&self, device: &dyn Device, peers: Vec<Peer>) -> PeerDiff {
        let mut current = self.current.lock();
        let mut fresh: HashMap<String, Peer> = HashMap::with_capacity(peers.len());
        let mut diff = PeerDiff::default();

        for mut peer in peers {
            let identity = peer.identity().to_string();
            if identity.is_empty() {
                tracing::warn!(category = %self.category, ip = %peer.ip, "Skipping peer without public key");
                diff.skipped += 1;
                continue;
            }

            peer.public_key_base64 = identity.clone();
            peer.category = self.category;

            if let Err(e) = device.add_peer(peer.clone()) {
                tracing::error!(category = %self.category, peer = %identity, error = %e, "Failed to register peer");
                diff.failed += 1;
            }

            if fresh.contains_key(&identity) {
                tracing::warn!(category = %self.category, peer = %identity, "Duplicate peer entry, last one wins");
            } else if current.contains_key(&identity) {
                diff.kept += 1;
            } else {
                diff.added.push(identity.clone());
            }
            fresh.insert(identity, peer);
        }

        for identity in current.keys() {
            if fresh.contains_key(identity) {
                continue;
            }
            if let Err(e) = device.remove_peer(identity) {
                tracing::error!(category = %self.category, peer = %identity, error = %e, "Failed to remove peer");
                diff.failed += 1;
            }
            diff.removed.push(identity.clone());
        }

        *current = fresh;

        tracing::info!(
            category = %self.category,
            added = diff.added.len(),
            kept = diff.kept,
            removed = diff.removed.len(),
            "Peers reconciled"
        );
        diff
    }

    /// Look up a live peer by identity.
    pub fn get(&self, identity: &str) -> Option<Peer> {
        self.current.lock().get(identity).cloned()
    }

    /// Whether `identity` is a live peer of this category.
    pub fn contains(&self, identity: &str) -> bool {
        self.current.lock().contains_key(identity)
    }

    /// Number of live peers.
    pub fn len(&self) -> usize {
        self.current.lock().len()
    }

    /// Whether the category has no live peers.
    pub fn is_empty(&self) -> bool {
        self.current.lock().is_empty()
    }

    /// Copy of the live peer map.
    pub fn snapshot(&self) -> HashMap<String, Peer> {
        self.current.lock().clone()
    }
}
