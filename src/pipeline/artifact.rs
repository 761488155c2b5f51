//! Artifact references: how one step's output names another step's input.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Version selector resolving to the most recent version of an artifact.
pub const LATEST: &str = "latest";

/// A reference to a named, versioned artifact in the tracking backend.
///
/// Rendered as `<name>:<version>`. This string is the sole wiring mechanism
/// between steps: the orchestrator constructs and passes references, it never
/// inspects artifact contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Artifact name as registered by the producing step.
    pub name: String,
    /// Version selector, typically the literal tag `latest`.
    pub version: String,
}

impl ArtifactRef {
    /// Creates a reference with an explicit version selector.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Creates a reference to the latest version of an artifact.
    pub fn latest(name: impl Into<String>) -> Self {
        Self::new(name, LATEST)
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_reference() {
        let reference = ArtifactRef::latest("raw_data.parquet");
        assert_eq!(reference.to_string(), "raw_data.parquet:latest");
    }

    #[test]
    fn test_explicit_version() {
        let reference = ArtifactRef::new("model_export", "v3");
        assert_eq!(reference.to_string(), "model_export:v3");
    }
}
