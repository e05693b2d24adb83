//! OpenTelemetry instruments for reconciliation.
//!
//! Tracks, per domain:
//! - Reload attempts/success/failures
//! - Reload duration
//! - Peers added and removed per category
//! - HTTP front-end starts and stops
//! - Time since the last successful reload
//!
//! # Examples
//!
//! ```rust,no_run
//! use hotswap_reconcile::prelude::*;
//! use hotswap_reconcile::device::PeerTable;
//! use opentelemetry::global;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<()> {
//! let coordinator = ReconciliationCoordinator::builder()
//!     .with_config_dir("/etc/access")
//!     .with_device(Arc::new(PeerTable::new()))
//!     .with_metrics(global::meter("access-server"))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

mod reconcile_metrics;

pub use reconcile_metrics::ReconcileMetrics;
