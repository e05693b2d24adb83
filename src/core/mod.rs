//! Core reconciliation types.

mod builder;
mod coordinator;
mod loader;
mod store;

pub use builder::{CoordinatorBuilder, DEFAULT_WATCH_DEBOUNCE};
pub use coordinator::ReconciliationCoordinator;
pub use loader::FailurePolicy;
pub use store::ConfigStore;
