//! Per-step parameter derivation.
//!
//! Each step has a fixed mapping from configuration fields and artifact
//! naming conventions to its parameter set. Derivation is a pure function of
//! the configuration: no parameter depends on the outcome of a previously
//! dispatched step, only on fixed conventions and configuration fields.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::PipelineConfig;

use super::artifact::ArtifactRef;
use super::step::{
    Step, DATASET_ROOT, PREPROCESSED_FILE, RAW_DATA_FILE, TEST_SPLIT_FILE, TRAIN_SPLIT_FILE,
};

/// One fully derived step invocation, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepInvocation {
    /// Which step this invocation runs.
    pub step: Step,
    /// Step project directory, relative to the pipeline root.
    pub project_dir: PathBuf,
    /// Entry point within the step project.
    pub entry_point: String,
    /// Parameter name to value, ordered for deterministic rendering.
    pub parameters: BTreeMap<String, String>,
}

/// Derives the invocation for a step from the configuration.
///
/// `model_config` is the deterministic path of the materialized model
/// sub-configuration; only the training step reads it. The file does not
/// need to exist at derivation time.
pub fn derive(step: Step, config: &PipelineConfig, model_config: &Path) -> StepInvocation {
    let mut parameters = BTreeMap::new();
    let mut param = |key: &str, value: String| {
        parameters.insert(key.to_string(), value);
    };

    match step {
        Step::Download => {
            param("file_url", config.data.file_url.clone());
            param("artifact_name", RAW_DATA_FILE.to_string());
            param("artifact_type", "raw_data".to_string());
            param("artifact_description", "Data as downloaded".to_string());
        }
        Step::Preprocess => {
            param("input_artifact", ArtifactRef::latest(RAW_DATA_FILE).to_string());
            param("artifact_name", PREPROCESSED_FILE.to_string());
            param("artifact_type", "processed_data".to_string());
            param("artifact_description", "Data after processing".to_string());
        }
        Step::CheckData => {
            param("reference_artifact", config.data.reference_dataset.clone());
            param(
                "sample_artifact",
                ArtifactRef::latest(PREPROCESSED_FILE).to_string(),
            );
            param("ks_alpha", config.data.ks_alpha.to_string());
        }
        Step::Segregate => {
            param(
                "input_artifact",
                ArtifactRef::latest(PREPROCESSED_FILE).to_string(),
            );
            param("artifact_root", DATASET_ROOT.to_string());
            param("artifact_type", "stratified_data".to_string());
            param("test_size", config.data.test_size.to_string());
            param("stratify", config.data.stratify.clone());
        }
        Step::RandomForest => {
            param("train_data", ArtifactRef::latest(TRAIN_SPLIT_FILE).to_string());
            param("model_config", model_config.display().to_string());
            param(
                "export_artifact",
                config.random_forest_pipeline.export_artifact.clone(),
            );
            param("random_seed", config.main.random_seed.to_string());
            param("val_size", config.data.val_size.to_string());
            param("stratify", config.data.stratify.clone());
        }
        Step::Evaluate => {
            param(
                "model_export",
                ArtifactRef::latest(&config.random_forest_pipeline.export_artifact).to_string(),
            );
            param("test_data", ArtifactRef::latest(TEST_SPLIT_FILE).to_string());
        }
    }

    StepInvocation {
        step,
        project_dir: step.dir().to_path_buf(),
        entry_point: step.entry_point().to_string(),
        parameters,
    }
}
