//! Pipeline configuration: document model and loader.
//!
//! The configuration is a YAML document with three fixed sections (`main`,
//! `data`, `random_forest_pipeline`). The orchestrator supplies no defaults:
//! every field referenced by a selected step must be present in the document,
//! and a missing field surfaces as a [`ConfigError`] at load time, before any
//! step runs.

mod loader;

pub use loader::ConfigLoader;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading the configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML.
    #[error("failed to parse configuration file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The document parsed but is missing or has malformed fields.
    #[error("invalid configuration: {0}")]
    Invalid(#[source] serde_yaml::Error),

    /// An override was not given as KEY=VALUE.
    #[error("invalid override '{0}': expected <dotted.key>=<value>")]
    MalformedOverride(String),

    /// An override path names a section that does not exist in the document.
    #[error("override path '{0}' does not exist in the configuration")]
    UnknownOverridePath(String),
}

/// The full pipeline configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Project identity, step selection, and seeding.
    pub main: MainConfig,
    /// Parameters consumed by the data steps.
    pub data: DataConfig,
    /// The model subtree, serialized verbatim for the training step.
    pub random_forest_pipeline: ModelConfig,
}

/// The `main` section: run identity and step selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainConfig {
    /// Project name under which the tracking backend groups all runs.
    pub project_name: String,
    /// Run-group (experiment) name shared by every step of this run.
    pub experiment_name: String,
    /// Which steps to execute, as a list or a comma-separated string.
    pub execute_steps: StepsSpec,
    /// Random seed forwarded to the training step.
    pub random_seed: u64,
}

/// The `data` section: parameters for download, validation, and segregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Source URL the download step fetches the raw dataset from.
    pub file_url: String,
    /// Reference dataset the statistical checks compare against.
    pub reference_dataset: String,
    /// Threshold for the Kolmogorov-Smirnov test in the check step.
    pub ks_alpha: f64,
    /// Fraction of the data held out as the test split.
    pub test_size: f64,
    /// Fraction of the training data held out for validation.
    pub val_size: f64,
    /// Column used for stratified splitting.
    pub stratify: String,
}

/// The `random_forest_pipeline` section.
///
/// Only `export_artifact` is read by the orchestrator; everything else in the
/// section (hyperparameters, feature lists, ...) is captured verbatim and
/// re-serialized for the training step by the materializer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Name under which the training step exports the fitted model.
    pub export_artifact: String,
    /// Opaque remainder of the section, passed through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Step selection as it appears in the document or on the command line.
///
/// Accepts both a YAML sequence (`[download, preprocess]`) and a flat
/// comma-separated string (`"download,preprocess"`). [`StepsSpec::names`] is
/// the single normalization point; nothing deeper in the pipeline branches on
/// the representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepsSpec {
    /// Already list-valued, as in the YAML document.
    List(Vec<String>),
    /// Comma-separated, as passed on the command line.
    Csv(String),
}

impl StepsSpec {
    /// Normalizes both representations to a list of step names.
    ///
    /// Entries are trimmed and empty entries dropped, so `""` and `[]` both
    /// normalize to no steps at all.
    pub fn names(&self) -> Vec<String> {
        let raw: Vec<String> = match self {
            StepsSpec::List(items) => items.clone(),
            StepsSpec::Csv(csv) => csv.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }
}
