//! Axum-based HTTP front-end.

use super::{FrontendFactory, HttpFrontend};
use crate::model::HttpConfig;
use async_trait::async_trait;
use axum::{Router, routing::get};
use axum_server::Handle;
use axum_server::tls_rustls::{RustlsConfig, from_tcp_rustls};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::timeout::TimeoutLayer;

struct Running {
    handle: Handle,
    task: JoinHandle<()>,
    local_addr: SocketAddr,
    drain: Duration,
}

/// HTTP front-end served by axum, plain or over rustls.
///
/// Every instance answers `GET /healthz`; embedders add their own routes with
/// [`AxumFrontend::with_router`]. The request read and response write timeouts
/// together bound each request, and the idle timeout bounds how long
/// [`HttpFrontend::stop`] waits for open connections to drain.
pub struct AxumFrontend {
    router: Router,
    running: Arc<AtomicBool>,
    state: Mutex<Option<Running>>,
}

impl AxumFrontend {
    /// Front-end serving only the health route.
    pub fn new() -> Self {
        Self::with_router(Router::new())
    }

    /// Front-end serving `router` plus the health route.
    pub fn with_router(router: Router) -> Self {
        let router = Router::new()
            .route("/healthz", get(|| async { "ok" }))
            .merge(router);
        Self {
            router,
            running: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(None),
        }
    }

    /// Factory producing a fresh front-end around `router` on every start.
    pub fn factory(router: Router) -> FrontendFactory {
        Arc::new(move || Arc::new(AxumFrontend::with_router(router.clone())) as Arc<dyn HttpFrontend>)
    }

    /// Address the listener is bound to while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.state.lock().as_ref().map(|running| running.local_addr)
    }

    #[allow(deprecated)]
    fn app(&self, config: &HttpConfig) -> Router {
        self.router
            .clone()
            .layer(TimeoutLayer::new(config.read_timeout() + config.write_timeout()))
    }
}

impl Default for AxumFrontend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpFrontend for AxumFrontend {
    async fn start(&self, config: &HttpConfig) -> std::io::Result<()> {
        if self.is_running() {
            tracing::debug!("HTTP front-end already running");
            return Ok(());
        }

        let listener = std::net::TcpListener::bind(config.listen_addr())?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let app = self.app(config).into_make_service();
        let handle = Handle::new();
        let running = Arc::clone(&self.running);

        let tls = if config.enable_tls {
            Some(RustlsConfig::from_pem_file(&config.tls_cert_file, &config.tls_key_file).await?)
        } else {
            None
        };

        self.running.store(true, Ordering::Release);
        let task = match tls {
            Some(tls) => {
                let server = from_tcp_rustls(listener, tls).handle(handle.clone());
                tokio::spawn(async move {
                    if let Err(e) = server.serve(app).await {
                        tracing::error!(error = %e, "HTTPS front-end terminated");
                    }
                    running.store(false, Ordering::Release);
                })
            }
            None => {
                let server = axum_server::from_tcp(listener).handle(handle.clone());
                tokio::spawn(async move {
                    if let Err(e) = server.serve(app).await {
                        tracing::error!(error = %e, "HTTP front-end terminated");
                    }
                    running.store(false, Ordering::Release);
                })
            }
        };

        *self.state.lock() = Some(Running {
            handle,
            task,
            local_addr,
            drain: config.idle_timeout(),
        });

        tracing::info!(address = %local_addr, tls = config.enable_tls, "HTTP front-end listening");
        Ok(())
    }

    async fn stop(&self) {
        let running = self.state.lock().take();
        let Some(running) = running else {
            return;
        };

        running.handle.graceful_shutdown(Some(running.drain));
        if let Err(e) = running.task.await {
            tracing::warn!(error = %e, "HTTP front-end task did not finish cleanly");
        }
        self.running.store(false, Ordering::Release);
        tracing::info!(address = %running.local_addr, "HTTP front-end stopped");
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn loopback() -> HttpConfig {
        HttpConfig {
            enable_http: true,
            listen_ip: "127.0.0.1".to_string(),
            listen_port: 0,
            ..Default::default()
        }
        .with_defaults()
    }

    fn ephemeral() -> HttpConfig {
        // with_defaults replaces port 0, so pick a free port explicitly.
        let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = probe.local_addr().unwrap().port();
        drop(probe);
        HttpConfig {
            listen_port: port,
            ..loopback()
        }
    }

    #[tokio::test]
    async fn test_start_serves_health_and_stops() {
        let frontend = AxumFrontend::new();
        frontend.start(&ephemeral()).await.unwrap();
        assert!(frontend.is_running());

        let addr = frontend.local_addr().unwrap();
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with("ok"));

        frontend.stop().await;
        assert!(!frontend.is_running());
        assert!(frontend.local_addr().is_none());
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let config = HttpConfig {
            listen_port: taken.local_addr().unwrap().port(),
            ..loopback()
        };

        let frontend = AxumFrontend::new();
        assert!(frontend.start(&config).await.is_err());
        assert!(!frontend.is_running());
    }

    #[tokio::test]
    async fn test_missing_tls_material_is_reported() {
        let config = HttpConfig {
            enable_tls: true,
            tls_cert_file: "/nonexistent/cert.pem".to_string(),
            tls_key_file: "/nonexistent/key.pem".to_string(),
            ..ephemeral()
        };

        let frontend = AxumFrontend::new();
        assert!(frontend.start(&config).await.is_err());
        assert!(!frontend.is_running());
    }
}
