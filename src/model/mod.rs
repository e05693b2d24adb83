//! Typed shapes of every configuration domain.
//!
//! Field names map case-sensitively to the keys used in the server's
//! configuration files, so most fields carry an explicit `serde(rename)`.

mod base;
mod http;
mod peer;
mod resource;

pub use base::BaseConfig;
pub use http::{
    DEFAULT_HTTP_IDLE_TIMEOUT_MS, DEFAULT_HTTP_LISTEN_PORT, DEFAULT_HTTP_READ_TIMEOUT_MS,
    DEFAULT_HTTP_WRITE_TIMEOUT_MS, HttpConfig,
};
pub use peer::{Peer, PeerCategory, PeerFile};
pub use resource::{
    AuthServiceFile, AuthServiceMap, AuthServiceProvider, NetAddress, ProviderSpec,
    ResourceGroup, ResourceGroupSpec, SourceIpMap,
};
