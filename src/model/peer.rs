use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a peer. Each category has its own file and its own live map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeerCategory {
    /// Administrative console (access controller) peers.
    Console,
    /// Agent peers.
    Agent,
    /// Resource/database peers.
    ResourceDb,
}

impl PeerCategory {
    /// All categories.
    pub const ALL: [PeerCategory; 3] = [Self::Console, Self::Agent, Self::ResourceDb];

    /// Short label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::Agent => "agent",
            Self::ResourceDb => "resource-db",
        }
    }
}

impl fmt::Display for PeerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A network peer known to the device registry.
///
/// The public key is the identity; two peers with the same key are the same
/// peer, whatever their address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Peer {
    /// Public key, base64 encoded. A missing key reads as empty and the
    /// entry is skipped during reconciliation.
    #[serde(rename = "PubKeyBase64", default)]
    pub public_key_base64: String,

    /// Peer IP address.
    #[serde(rename = "Ip", default)]
    pub ip: String,

    /// Peer port.
    #[serde(rename = "Port", default)]
    pub port: u16,

    /// Optional host name used instead of the IP when resolvable.
    #[serde(rename = "Hostname", default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// Unix timestamp (seconds) after which the peer is no longer trusted.
    #[serde(rename = "ExpireTime", default, skip_serializing_if = "Option::is_none")]
    pub expire_time: Option<i64>,

    /// Stamped during reconciliation; never read from the file.
    #[serde(skip, default = "default_category")]
    pub category: PeerCategory,
}

fn default_category() -> PeerCategory {
    PeerCategory::Console
}

impl Peer {
    /// Create a peer with just an identity and an address.
    pub fn new(public_key_base64: impl Into<String>, ip: impl Into<String>, port: u16) -> Self {
        Self {
            public_key_base64: public_key_base64.into(),
            ip: ip.into(),
            port,
            hostname: None,
            expire_time: None,
            category: default_category(),
        }
    }

    /// The registry identity of this peer.
    pub fn identity(&self) -> &str {
        self.public_key_base64.trim()
    }
}

/// One peer file. Every category shares this shape and reads its own array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PeerFile {
    /// Console peers.
    #[serde(rename = "ACs")]
    pub consoles: Vec<Peer>,

    /// Agent peers.
    #[serde(rename = "Agents")]
    pub agents: Vec<Peer>,

    /// Resource/database peers.
    #[serde(rename = "DBs")]
    pub resource_dbs: Vec<Peer>,
}

impl PeerFile {
    /// Take the peers listed for `category`, discarding the others.
    pub fn into_category(self, category: PeerCategory) -> Vec<Peer> {
        match category {
            PeerCategory::Console => self.consoles,
            PeerCategory::Agent => self.agents,
            PeerCategory::ResourceDb => self.resource_dbs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_peer_file() {
        let file: PeerFile = toml::from_str(
            r#"
[[ACs]]
PubKeyBase64 = "YWMtb25l"
Ip = "10.0.0.1"
Port = 62206
ExpireTime = 1924992000

[[Agents]]
PubKeyBase64 = " YWdlbnQ= "
"#,
        )
        .unwrap();

        assert_eq!(file.consoles.len(), 1);
        assert_eq!(file.consoles[0].port, 62206);
        assert_eq!(file.consoles[0].expire_time, Some(1924992000));
        assert_eq!(file.agents[0].identity(), "YWdlbnQ=");
        assert!(file.clone().into_category(PeerCategory::ResourceDb).is_empty());
        assert_eq!(file.into_category(PeerCategory::Agent).len(), 1);
    }

    #[test]
    fn test_missing_public_key_reads_as_empty() {
        let file: PeerFile = toml::from_str(
            r#"
[[Agents]]
PubKeyBase64 = "QQ=="
Ip = "10.0.0.1"

[[Agents]]
Ip = "10.0.0.9"
Port = 51820
"#,
        )
        .unwrap();
        assert_eq!(file.agents.len(), 2);
        assert_eq!(file.agents[1].identity(), "");
    }

    #[test]
    fn test_category_is_not_read_from_file() {
        let file: PeerFile = toml::from_str(
            r#"
[[DBs]]
PubKeyBase64 = "ZGI="
category = "Agent"
"#,
        )
        .unwrap();
        assert_eq!(file.resource_dbs[0].category, PeerCategory::Console);
    }
}
