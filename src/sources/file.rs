//! File-based configuration source.

use super::ConfigSource;
use std::path::Path;

/// Reads domain files straight from the local file system.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_reconcile::sources::{ConfigSource, FileSource};
/// use std::path::Path;
///
/// let source = FileSource::new();
/// let bytes = source.read_all(Path::new("/etc/access/config.toml"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl FileSource {
    /// Create a new file source.
    pub fn new() -> Self {
        Self
    }
}

impl ConfigSource for FileSource {
    fn read_all(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn name(&self) -> String {
        "file".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("srcip.toml");
        fs::write(&path, "\"10.0.0.1\" = []").unwrap();

        let bytes = FileSource::new().read_all(&path).unwrap();
        assert_eq!(bytes, b"\"10.0.0.1\" = []");
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = FileSource::new()
            .read_all(&temp_dir.path().join("missing.toml"))
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
