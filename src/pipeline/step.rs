//! The canonical step list and its dependency order.
//!
//! Steps are statically enumerated, not discovered. Each step has a fixed
//! identifier, a fixed project directory (relative to the pipeline root), a
//! fixed entry point, and declared artifact inputs/outputs. The canonical
//! order is the single source of ordering truth: selection filters
//! [`Step::CANONICAL_ORDER`] rather than re-deriving order from the request.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// File name of the raw dataset produced by the download step.
pub const RAW_DATA_FILE: &str = "raw_data.parquet";

/// File name of the cleaned dataset produced by the preprocess step.
pub const PREPROCESSED_FILE: &str = "preprocessed_data.csv";

/// Root name the segregate step derives its split artifacts from.
pub const DATASET_ROOT: &str = "dataset";

/// File name of the training split produced by the segregate step.
pub const TRAIN_SPLIT_FILE: &str = "dataset_train.csv";

/// File name of the test split produced by the segregate step.
pub const TEST_SPLIT_FILE: &str = "dataset_test.csv";

/// One independently packaged unit of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Fetch the raw dataset from its source URL.
    Download,
    /// Clean the raw dataset into the processed CSV.
    Preprocess,
    /// Statistical checks of the processed data against a reference.
    CheckData,
    /// Stratified split into train and test sets.
    Segregate,
    /// Fit and export the random forest model.
    RandomForest,
    /// Score the exported model on the held-out test split.
    Evaluate,
}

/// Artifacts exchanged between steps, named here so a plan can be inspected
/// for inputs no earlier step produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineArtifact {
    /// `raw_data.parquet`, produced by download.
    RawData,
    /// `preprocessed_data.csv`, produced by preprocess.
    PreprocessedData,
    /// `dataset_train.csv`, produced by segregate.
    TrainSplit,
    /// `dataset_test.csv`, produced by segregate.
    TestSplit,
    /// The fitted model export; its name comes from the configuration.
    ModelExport,
}

impl PipelineArtifact {
    /// The fixed artifact file name, where one exists.
    ///
    /// The model export is the one artifact named by configuration rather
    /// than by convention, so it has no fixed name.
    pub fn fixed_name(&self) -> Option<&'static str> {
        match self {
            PipelineArtifact::RawData => Some(RAW_DATA_FILE),
            PipelineArtifact::PreprocessedData => Some(PREPROCESSED_FILE),
            PipelineArtifact::TrainSplit => Some(TRAIN_SPLIT_FILE),
            PipelineArtifact::TestSplit => Some(TEST_SPLIT_FILE),
            PipelineArtifact::ModelExport => None,
        }
    }
}

impl fmt::Display for PipelineArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fixed_name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "model export"),
        }
    }
}

impl Step {
    /// The fixed, dependency-respecting execution order.
    pub const CANONICAL_ORDER: [Step; 6] = [
        Step::Download,
        Step::Preprocess,
        Step::CheckData,
        Step::Segregate,
        Step::RandomForest,
        Step::Evaluate,
    ];

    /// The step's identifier as it appears in `execute_steps`.
    pub fn id(&self) -> &'static str {
        match self {
            Step::Download => "download",
            Step::Preprocess => "preprocess",
            Step::CheckData => "check_data",
            Step::Segregate => "segregate",
            Step::RandomForest => "random_forest",
            Step::Evaluate => "evaluate",
        }
    }

    /// The step's project directory, relative to the pipeline root.
    pub fn dir(&self) -> &Path {
        Path::new(self.id())
    }

    /// The entry point the run-management facility invokes.
    pub fn entry_point(&self) -> &'static str {
        "main"
    }

    /// Artifacts this step consumes from earlier steps.
    pub fn inputs(&self) -> &'static [PipelineArtifact] {
        match self {
            Step::Download => &[],
            Step::Preprocess => &[PipelineArtifact::RawData],
            Step::CheckData => &[PipelineArtifact::PreprocessedData],
            Step::Segregate => &[PipelineArtifact::PreprocessedData],
            Step::RandomForest => &[PipelineArtifact::TrainSplit],
            Step::Evaluate => &[PipelineArtifact::ModelExport, PipelineArtifact::TestSplit],
        }
    }

    /// Artifacts this step produces for later steps.
    pub fn outputs(&self) -> &'static [PipelineArtifact] {
        match self {
            Step::Download => &[PipelineArtifact::RawData],
            Step::Preprocess => &[PipelineArtifact::PreprocessedData],
            Step::CheckData => &[],
            Step::Segregate => &[PipelineArtifact::TrainSplit, PipelineArtifact::TestSplit],
            Step::RandomForest => &[PipelineArtifact::ModelExport],
            Step::Evaluate => &[],
        }
    }

    /// Looks a step up by its identifier.
    pub fn from_name(name: &str) -> Option<Step> {
        Step::CANONICAL_ORDER
            .into_iter()
            .find(|step| step.id() == name)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}
