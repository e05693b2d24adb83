//! # hotswap-reconcile
//!
//! Live configuration reconciliation for long-running network access servers.
//!
//! ## Overview
//!
//! A server's configuration is split into independent domains, each backed by
//! its own file and its own watch:
//!
//! | Domain          | File            | Applied as                              |
//! |-----------------|-----------------|-----------------------------------------|
//! | base            | `config.toml`   | field by field, hot fields only         |
//! | http            | `http.toml`     | start/stop of the HTTP front-end        |
//! | console peers   | `ac.toml`       | add/remove diff against the device      |
//! | agent peers     | `agent.toml`    | add/remove diff against the device      |
//! | resource peers  | `db.toml`       | add/remove diff against the device      |
//! | auth services   | `resource.toml` | wholesale map swap plus plugin loading  |
//! | source IPs      | `srcip.toml`    | wholesale map swap                      |
//!
//! A change to one file reloads only its domain. Malformed input never takes
//! the process down: read and parse failures are reported and handled per
//! [`FailurePolicy`](core::FailurePolicy), and a panic during a reload is
//! contained and reported as a load fault.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hotswap_reconcile::prelude::*;
//! use hotswap_reconcile::device::PeerTable;
//! use std::sync::Arc;
//!
//! # async fn example() -> hotswap_reconcile::error::Result<()> {
//! let device = Arc::new(PeerTable::new());
//! let coordinator = ReconciliationCoordinator::builder()
//!     .with_config_dir("/etc/access")
//!     .with_device(device.clone())
//!     .build()?;
//!
//! // Initial load of every domain, then watch the files
//! coordinator.start().await?;
//!
//! // The protocol path reads live state concurrently
//! let agents = coordinator.peers(PeerCategory::Agent).len();
//! let route = coordinator.source_ips().get("10.0.0.7");
//! # let _ = (agents, route);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `file-watch` (default): debounced file watching via `notify`
//! - `http-frontend` (default): axum-based HTTP front-end
//! - `json`: `.json` domain files
//! - `metrics`: OpenTelemetry reload metrics

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod device;
pub mod domain;
pub mod error;
pub mod frontend;
pub mod model;
pub mod notify;
pub mod plugin;
pub mod reconcile;
pub mod sources;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{CoordinatorBuilder, FailurePolicy, ReconciliationCoordinator};
    pub use crate::device::Device;
    pub use crate::domain::Domain;
    pub use crate::error::{ConfigError, Result};
    pub use crate::model::PeerCategory;
}
