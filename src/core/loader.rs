//! Read-and-parse step of a domain reload.

use crate::domain::Domain;
use crate::error::ConfigError;
use crate::sources::{ConfigSource, Format};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

/// What a reload does with a domain whose file could not be read or parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Apply the type's zero value. A missing or malformed peer file clears
    /// that category and a malformed map file empties the map.
    #[default]
    ApplyZeroValue,
    /// Skip the apply step and keep the previously applied state.
    PreservePrevious,
}

/// Result of loading one domain file.
#[derive(Debug)]
pub(crate) struct Loaded<T> {
    /// Value to apply, or `None` when the apply step must be skipped.
    pub(crate) value: Option<T>,
    /// Read or parse failure, reported after the apply step.
    pub(crate) error: Option<ConfigError>,
}

/// Reads domain files through a [`ConfigSource`] and deserializes them.
pub(crate) struct DomainLoader {
    source: Arc<dyn ConfigSource>,
    policy: FailurePolicy,
}

impl DomainLoader {
    pub(crate) fn new(source: Arc<dyn ConfigSource>, policy: FailurePolicy) -> Self {
        Self { source, policy }
    }

    pub(crate) fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub(crate) fn source_name(&self) -> String {
        self.source.name()
    }

    /// Read and parse the file for `domain`, falling back per the policy.
    pub(crate) fn load<T>(&self, domain: Domain, path: &Path) -> Loaded<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.read_and_parse(domain, path) {
            Ok(value) => Loaded {
                value: Some(value),
                error: None,
            },
            Err(e) => {
                tracing::error!(domain = %domain, path = %path.display(), error = %e, policy = ?self.policy, "Failed to load config");
                let value = match self.policy {
                    FailurePolicy::ApplyZeroValue => Some(T::default()),
                    FailurePolicy::PreservePrevious => None,
                };
                Loaded {
                    value,
                    error: Some(e),
                }
            }
        }
    }

    fn read_and_parse<T: DeserializeOwned>(&self, domain: Domain, path: &Path) -> crate::error::Result<T> {
        let format = Format::from_path(path)?;
        let bytes = self
            .source
            .read_all(path)
            .map_err(|source| ConfigError::Read {
                domain,
                path: path.to_path_buf(),
                source,
            })?;
        format.parse(domain, &bytes)
    }
}
