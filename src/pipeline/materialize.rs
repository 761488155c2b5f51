//! Materializes the model sub-configuration for the training step.
//!
//! The training step does not read the pipeline configuration; it receives
//! the `random_forest_pipeline` subtree as a YAML file whose path is passed
//! as a parameter. The file is written fresh at a deterministic path for
//! every run, immediately before the step is dispatched.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::config::ModelConfig;

/// File name of the materialized model sub-configuration.
pub const MODEL_CONFIG_FILE: &str = "random_forest_config.yml";

/// Errors that can occur while writing the model sub-configuration.
///
/// Any failure here is fatal for the whole run; there is no fallback.
#[derive(Debug, Error)]
pub enum MaterializeError {
    /// The subtree could not be rendered as YAML.
    #[error("failed to serialize model configuration: {0}")]
    Serialize(#[from] serde_yaml::Error),

    /// The file could not be written.
    #[error("failed to write model configuration to '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Serializes the model subtree to `<dir>/random_forest_config.yml`,
/// overwriting any existing file, and returns the written path.
pub fn materialize(model: &ModelConfig, dir: &Path) -> Result<PathBuf, MaterializeError> {
    let path = dir.join(MODEL_CONFIG_FILE);
    let yaml = serde_yaml::to_string(model)?;
    fs::write(&path, yaml).map_err(|source| MaterializeError::Write {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), "materialized model configuration");
    Ok(path)
}
