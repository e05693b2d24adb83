//! Configuration domains and their on-disk file names.

use crate::model::PeerCategory;
use std::fmt;

/// One independently configured and independently watched subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Domain {
    /// Base server settings (`config.toml`).
    Base,
    /// Optional HTTP front-end (`http.toml`).
    Http,
    /// Administrative-console peers (`ac.toml`).
    ConsolePeers,
    /// Agent peers (`agent.toml`).
    AgentPeers,
    /// Resource/database peers (`db.toml`).
    ResourcePeers,
    /// Authorization-service providers and resource groups (`resource.toml`).
    AuthServices,
    /// Source-IP associations (`srcip.toml`).
    SourceIps,
}

impl Domain {
    /// Every domain in startup order. The base domain is always first.
    pub const ALL: [Domain; 7] = [
        Domain::Base,
        Domain::Http,
        Domain::ConsolePeers,
        Domain::AgentPeers,
        Domain::ResourcePeers,
        Domain::AuthServices,
        Domain::SourceIps,
    ];

    /// Short label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Http => "http",
            Self::ConsolePeers => "console-peers",
            Self::AgentPeers => "agent-peers",
            Self::ResourcePeers => "resource-peers",
            Self::AuthServices => "auth-services",
            Self::SourceIps => "source-ips",
        }
    }

    /// Default file name inside the configuration directory.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            Self::Base => "config.toml",
            Self::Http => "http.toml",
            Self::ConsolePeers => "ac.toml",
            Self::AgentPeers => "agent.toml",
            Self::ResourcePeers => "db.toml",
            Self::AuthServices => "resource.toml",
            Self::SourceIps => "srcip.toml",
        }
    }

    /// The peer category reconciled by this domain, if it is a peer domain.
    pub fn peer_category(&self) -> Option<PeerCategory> {
        match self {
            Self::ConsolePeers => Some(PeerCategory::Console),
            Self::AgentPeers => Some(PeerCategory::Agent),
            Self::ResourcePeers => Some(PeerCategory::ResourceDb),
            _ => None,
        }
    }
}

impl From<PeerCategory> for Domain {
    fn from(category: PeerCategory) -> Self {
        match category {
            PeerCategory::Console => Domain::ConsolePeers,
            PeerCategory::Agent => Domain::AgentPeers,
            PeerCategory::ResourceDb => Domain::ResourcePeers,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
