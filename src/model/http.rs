use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request read timeout applied when `ReadTimeoutMs` is zero or absent.
pub const DEFAULT_HTTP_READ_TIMEOUT_MS: u64 = 4500;
/// Response write timeout applied when `WriteTimeoutMs` is zero or absent.
pub const DEFAULT_HTTP_WRITE_TIMEOUT_MS: u64 = 4000;
/// Idle connection timeout applied when `IdleTimeoutMs` is zero or absent.
pub const DEFAULT_HTTP_IDLE_TIMEOUT_MS: u64 = 5000;
/// Port used when `HttpListenPort` is zero or absent.
pub const DEFAULT_HTTP_LISTEN_PORT: u16 = 62206;

/// HTTP front-end settings. Replaced wholesale on every reload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Run the HTTP front-end at all.
    #[serde(rename = "EnableHttp")]
    pub enable_http: bool,

    /// Serve over TLS using `tls_cert_file` / `tls_key_file`.
    #[serde(rename = "EnableTLS")]
    pub enable_tls: bool,

    /// Address to bind. Empty means all interfaces.
    #[serde(rename = "HttpListenIp")]
    pub listen_ip: String,

    /// Port to bind.
    #[serde(rename = "HttpListenPort")]
    pub listen_port: u16,

    /// PEM certificate chain.
    #[serde(rename = "TLSCertFile")]
    pub tls_cert_file: String,

    /// PEM private key.
    #[serde(rename = "TLSKeyFile")]
    pub tls_key_file: String,

    /// Request read timeout in milliseconds.
    #[serde(rename = "ReadTimeoutMs")]
    pub read_timeout_ms: u64,

    /// Response write timeout in milliseconds.
    #[serde(rename = "WriteTimeoutMs")]
    pub write_timeout_ms: u64,

    /// Keep-alive idle timeout in milliseconds.
    #[serde(rename = "IdleTimeoutMs")]
    pub idle_timeout_ms: u64,
}

impl HttpConfig {
    /// Replace zero-valued timeouts and port with their defaults.
    pub fn with_defaults(mut self) -> Self {
        if self.read_timeout_ms == 0 {
            self.read_timeout_ms = DEFAULT_HTTP_READ_TIMEOUT_MS;
        }
        if self.write_timeout_ms == 0 {
            self.write_timeout_ms = DEFAULT_HTTP_WRITE_TIMEOUT_MS;
        }
        if self.idle_timeout_ms == 0 {
            self.idle_timeout_ms = DEFAULT_HTTP_IDLE_TIMEOUT_MS;
        }
        if self.listen_port == 0 {
            self.listen_port = DEFAULT_HTTP_LISTEN_PORT;
        }
        self
    }

    /// `ip:port` string suitable for binding.
    pub fn listen_addr(&self) -> String {
        let ip = if self.listen_ip.is_empty() {
            "0.0.0.0"
        } else {
            self.listen_ip.as_str()
        };
        if ip.contains(':') {
            format!("[{}]:{}", ip, self.listen_port)
        } else {
            format!("{}:{}", ip, self.listen_port)
        }
    }

    /// Request read timeout.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Response write timeout.
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Idle connection timeout.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeouts_get_defaults() {
        let conf = HttpConfig::default().with_defaults();
        assert_eq!(conf.read_timeout_ms, 4500);
        assert_eq!(conf.write_timeout_ms, 4000);
        assert_eq!(conf.idle_timeout_ms, 5000);
        assert_eq!(conf.listen_port, DEFAULT_HTTP_LISTEN_PORT);
    }

    #[test]
    fn test_explicit_timeouts_are_kept() {
        let conf: HttpConfig = toml::from_str(
            r#"
EnableHttp = true
HttpListenIp = "127.0.0.1"
HttpListenPort = 8443
ReadTimeoutMs = 1000
IdleTimeoutMs = 9000
"#,
        )
        .unwrap();
        let conf = conf.with_defaults();

        assert!(conf.enable_http);
        assert_eq!(conf.read_timeout(), Duration::from_millis(1000));
        assert_eq!(conf.write_timeout(), Duration::from_millis(4000));
        assert_eq!(conf.idle_timeout(), Duration::from_millis(9000));
        assert_eq!(conf.listen_addr(), "127.0.0.1:8443");
    }

    #[test]
    fn test_listen_addr_formats() {
        let mut conf = HttpConfig {
            listen_port: 80,
            ..Default::default()
        };
        assert_eq!(conf.listen_addr(), "0.0.0.0:80");
        conf.listen_ip = "::1".to_string();
        assert_eq!(conf.listen_addr(), "[::1]:80");
    }
}
