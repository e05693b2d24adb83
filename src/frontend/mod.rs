//! The optional HTTP front-end the lifecycle manager starts and stops.

use crate::model::HttpConfig;
use async_trait::async_trait;
use std::sync::Arc;

#[cfg(feature = "http-frontend")]
mod axum_frontend;

#[cfg(feature = "http-frontend")]
pub use axum_frontend::AxumFrontend;

/// A listening HTTP server instance.
///
/// One instance is started at most once. The lifecycle manager asks the
/// [`FrontendFactory`] for a fresh instance every time it needs to start.
#[async_trait]
pub trait HttpFrontend: Send + Sync {
    /// Bind and begin serving with `config`. Returns once the listener is bound.
    ///
    /// # Errors
    ///
    /// Returns the bind or TLS setup error, e.g. when the port is in use.
    async fn start(&self, config: &HttpConfig) -> std::io::Result<()>;

    /// Stop serving and wait for the server task to finish.
    async fn stop(&self);

    /// Whether the server is currently accepting connections.
    fn is_running(&self) -> bool;
}

/// Produces a new, not yet started front-end.
pub type FrontendFactory = Arc<dyn Fn() -> Arc<dyn HttpFrontend> + Send + Sync>;
