//! Error types for hotswap-reconcile.

use crate::domain::Domain;
use std::path::PathBuf;

/// Result type alias for hotswap-reconcile operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading and reconciling configuration domains.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The domain file was missing or unreadable.
    #[error("Failed to read {domain} config from {}: {source}", .path.display())]
    Read {
        /// Domain whose file could not be read
        domain: Domain,
        /// Path that was read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The domain file content could not be deserialized.
    #[error("Failed to parse {domain} config: {reason}")]
    Parse {
        /// Domain whose file was malformed
        domain: Domain,
        /// Parser message
        reason: String,
    },

    /// Applying a parsed value to live state failed (e.g. a listener bind).
    #[error("Failed to apply {domain} config: {reason}")]
    Apply {
        /// Domain that failed to apply
        domain: Domain,
        /// What went wrong
        reason: String,
    },

    /// An unexpected fault occurred during the reload sequence.
    #[error("config load error")]
    LoadFault {
        /// Domain whose reload faulted
        domain: Domain,
    },

    /// File watching failed to initialize.
    #[error("File watching error: {0}")]
    WatchError(String),

    /// The file extension does not map to a known serialization format.
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// A plugin could not be loaded.
    #[error("Plugin error: {0}")]
    Plugin(String),

    /// The device registry rejected an operation.
    #[error("Device error: {0}")]
    Device(String),

    /// Generic error for other cases.
    #[error("Configuration error: {0}")]
    Other(String),
}

impl ConfigError {
    /// The domain this error is attributed to, if any.
    pub fn domain(&self) -> Option<Domain> {
        match self {
            Self::Read { domain, .. }
            | Self::Parse { domain, .. }
            | Self::Apply { domain, .. }
            | Self::LoadFault { domain } => Some(*domain),
            _ => None,
        }
    }

    /// Whether this is a read or parse failure, i.e. the input was bad rather
    /// than the live state refusing it.
    pub fn is_input_failure(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Parse { .. })
    }
}
