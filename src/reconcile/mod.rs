//! Reconcilers that bring live state in line with freshly parsed values.
//!
//! | Domain                   | Reconciler                     | Strategy            |
//! |--------------------------|--------------------------------|---------------------|
//! | base                     | [`BaseConfigReconciler`]       | field by field      |
//! | http                     | [`ServiceLifecycleManager`]    | start/stop toggle   |
//! | console/agent/resource   | [`PeerReconciler`]             | add/remove diff     |
//! | auth services            | [`AuthServiceReconciler`]      | wholesale swap      |
//! | source IPs               | [`reconcile_source_ips`]       | wholesale swap      |

mod base;
mod lifecycle;
mod maps;
mod peers;

pub use base::{BaseChanges, BaseConfigReconciler, LogLevelHook};
pub use lifecycle::{LifecycleAction, ServiceLifecycleManager};
pub use maps::{AuthServiceReconciler, MapStore, reconcile_source_ips};
pub use peers::{PeerDiff, PeerReconciler};
