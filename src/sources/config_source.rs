//! Configuration source trait.

use std::path::Path;

/// Trait for configuration sources.
///
/// Implement this trait to read domain files from somewhere other than the
/// local file system (an embedded bundle, a test fixture, a secrets store).
/// Sources are called from reload workers and must be safe to share.
pub trait ConfigSource: Send + Sync {
    /// Read the full contents stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the content is missing or unreadable. The
    /// coordinator attaches the domain and path before logging it.
    fn read_all(&self, path: &Path) -> std::io::Result<Vec<u8>>;

    /// Get a human-readable name for this source (for logging/debugging).
    fn name(&self) -> String;
}

impl<S: ConfigSource + ?Sized> ConfigSource for std::sync::Arc<S> {
    fn read_all(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        (**self).read_all(path)
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

