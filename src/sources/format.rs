//! Serialization formats for domain files.

use crate::domain::Domain;
use crate::error::{ConfigError, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Structural deserializer for one domain file.
///
/// The format is detected from the file extension:
/// - `.toml` -> TOML
/// - `.json` -> JSON (requires the `json` feature)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// TOML, the native format of the server's config directory.
    Toml,
    /// JSON.
    #[cfg(feature = "json")]
    Json,
}

impl Format {
    /// Detect the format of `path` from its extension.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` for unknown or missing extensions.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                ConfigError::UnsupportedFormat(format!(
                    "unable to determine file format for: {}",
                    path.display()
                ))
            })?;

        match extension {
            "toml" => Ok(Self::Toml),
            #[cfg(feature = "json")]
            "json" => Ok(Self::Json),
            other => Err(ConfigError::UnsupportedFormat(format!(
                "unsupported file extension: {}",
                other
            ))),
        }
    }

    /// Deserialize `bytes` into `T`.
    ///
    /// Empty input is handed to the parser as-is, so types whose fields all
    /// default come back as their zero value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` tagged with `domain` when the content is
    /// not valid UTF-8 or does not match the shape of `T`.
    pub fn parse<T: DeserializeOwned>(&self, domain: Domain, bytes: &[u8]) -> Result<T> {
        let parse_err = |reason: String| ConfigError::Parse { domain, reason };
        match self {
            Self::Toml => {
                let text = std::str::from_utf8(bytes).map_err(|e| parse_err(e.to_string()))?;
                toml::from_str(text).map_err(|e| parse_err(e.message().to_string()))
            }
            #[cfg(feature = "json")]
            Self::Json => {
                if bytes.iter().all(u8::is_ascii_whitespace) {
                    return serde_json::from_slice(b"{}").map_err(|e| parse_err(e.to_string()));
                }
                serde_json::from_slice(bytes).map_err(|e| parse_err(e.to_string()))
            }
        }
    }
}
