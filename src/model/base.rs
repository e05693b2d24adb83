use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

/// Base server settings.
///
/// A single instance lives for the whole process. Only the log level, the
/// default cipher scheme and the agent validation toggle are applied on
/// reload; identity and listen fields take effect on restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BaseConfig {
    /// Server private key, base64 encoded.
    #[serde(rename = "PrivateKeyBase64")]
    pub private_key_base64: String,

    /// Advertised host name.
    #[serde(rename = "Hostname")]
    pub hostname: String,

    /// Address the protocol listener binds to.
    #[serde(rename = "ListenIp")]
    pub listen_ip: String,

    /// Port the protocol listener binds to.
    #[serde(rename = "ListenPort")]
    pub listen_port: u16,

    /// Numeric log verbosity, 0 (silent) through 5 (trace).
    #[serde(rename = "LogLevel")]
    pub log_level: i32,

    /// Identifier of the default cryptographic scheme.
    #[serde(rename = "DefaultCipherScheme")]
    pub default_cipher_scheme: i32,

    /// Skip validation of agent peers against the agent peer list.
    #[serde(rename = "DisableAgentValidation")]
    pub disable_agent_validation: bool,
}

impl BaseConfig {
    /// Map the numeric log level onto a tracing filter.
    pub fn level_filter(&self) -> LevelFilter {
        match self.log_level {
            i32::MIN..=0 => LevelFilter::OFF,
            1 => LevelFilter::ERROR,
            2 => LevelFilter::WARN,
            3 => LevelFilter::INFO,
            4 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Names of restart-only fields that differ between `self` and `other`.
    pub(crate) fn restart_fields_differ(&self, other: &BaseConfig) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.private_key_base64 != other.private_key_base64 {
            changed.push("PrivateKeyBase64");
        }
        if self.hostname != other.hostname {
            changed.push("Hostname");
        }
        if self.listen_ip != other.listen_ip {
            changed.push("ListenIp");
        }
        if self.listen_port != other.listen_port {
            changed.push("ListenPort");
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_config() {
        let conf: BaseConfig = toml::from_str(
            r#"
PrivateKeyBase64 = "c2VydmVyLWtleQ=="
Hostname = "access.example.net"
ListenIp = "0.0.0.0"
ListenPort = 62206
LogLevel = 4
DefaultCipherScheme = 1
DisableAgentValidation = true
"#,
        )
        .unwrap();

        assert_eq!(conf.hostname, "access.example.net");
        assert_eq!(conf.listen_port, 62206);
        assert_eq!(conf.level_filter(), LevelFilter::DEBUG);
        assert!(conf.disable_agent_validation);
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let conf: BaseConfig = toml::from_str("loglevel = 4").unwrap();
        assert_eq!(conf.log_level, 0);
    }

    #[test]
    fn test_restart_fields() {
        let old = BaseConfig {
            listen_port: 1,
            log_level: 2,
            ..Default::default()
        };
        let new = BaseConfig {
            listen_port: 2,
            log_level: 3,
            ..Default::default()
        };
        assert_eq!(old.restart_fields_differ(&new), vec!["ListenPort"]);
    }
}
