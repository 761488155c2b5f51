//! The pipeline orchestrator: resolves the plan and dispatches each step.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::runner::{DispatchError, RunHandle, StepRunner};
use crate::tracking::TrackingContext;

use super::materialize::{materialize, MaterializeError, MODEL_CONFIG_FILE};
use super::params::{derive, StepInvocation};
use super::plan::ExecutionPlan;
use super::step::Step;

/// Errors that abort a pipeline run.
///
/// Every failure at this level is fatal to the whole run: the pipeline is a
/// batch process with no resume, so there is no recovered error category.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The model sub-configuration could not be written.
    #[error("failed to materialize model configuration: {0}")]
    Materialize(#[from] MaterializeError),

    /// A step's dispatch call failed; downstream steps were not dispatched.
    #[error("step '{step}' failed: {source}")]
    Dispatch {
        step: Step,
        #[source]
        source: DispatchError,
    },
}

/// Translates the configuration into a sequence of step dispatches.
///
/// Steps run strictly sequentially in canonical order; each dispatch call
/// blocks until the step's process has completed. That sequential, blocking
/// dispatch is the only ordering guarantee the orchestrator provides - the
/// parameter derivation itself never depends on a previous step's outcome.
pub struct Pipeline {
    config: PipelineConfig,
    runner: Arc<dyn StepRunner>,
    tracking: TrackingContext,
    work_dir: PathBuf,
}

impl Pipeline {
    /// Creates a pipeline over the given configuration and runner.
    ///
    /// `work_dir` is where the model sub-configuration is materialized;
    /// callers normally pass the current working directory.
    pub fn new(
        config: PipelineConfig,
        runner: Arc<dyn StepRunner>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        let tracking = TrackingContext::from_config(&config.main);
        Self {
            config,
            runner,
            tracking,
            work_dir: work_dir.into(),
        }
    }

    /// The execution plan this pipeline would run.
    pub fn plan(&self) -> ExecutionPlan {
        ExecutionPlan::resolve(&self.config.main.execute_steps)
    }

    /// The derived invocation for every selected step, without dispatching.
    pub fn invocations(&self) -> Vec<StepInvocation> {
        let model_config = self.work_dir.join(MODEL_CONFIG_FILE);
        self.plan()
            .iter()
            .map(|step| derive(step, &self.config, &model_config))
            .collect()
    }

    /// Runs every selected step in canonical order.
    ///
    /// Returns the run handles of the dispatched steps. The first failure
    /// aborts the run; steps after it are never dispatched. An empty plan
    /// completes normally with no dispatches.
    pub async fn run(&self) -> Result<Vec<RunHandle>, OrchestratorError> {
        let plan = self.plan();
        if plan.is_empty() {
            info!("no steps selected, nothing to execute");
            return Ok(Vec::new());
        }

        info!(plan = %plan, "resolved execution plan");
        for (step, artifact) in plan.unsatisfied_inputs() {
            warn!(
                step = %step,
                artifact = %artifact,
                "input is not produced by an earlier selected step; assuming it exists from a previous run"
            );
        }

        let model_config = self.work_dir.join(MODEL_CONFIG_FILE);
        let mut handles = Vec::with_capacity(plan.len());

        for step in plan.iter() {
            if step == Step::RandomForest {
                materialize(&self.config.random_forest_pipeline, &self.work_dir)?;
            }

            let invocation = derive(step, &self.config, &model_config);
            info!(step = %step, "dispatching step");

            let handle = self
                .runner
                .invoke(
                    &invocation.project_dir,
                    &invocation.entry_point,
                    &invocation.parameters,
                    &self.tracking,
                )
                .await
                .map_err(|source| OrchestratorError::Dispatch { step, source })?;

            info!(step = %step, run_id = %handle.run_id, "step completed");
            handles.push(handle);
        }

        Ok(handles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DataConfig, MainConfig, ModelConfig, StepsSpec};
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records every invocation it receives; optionally fails on one step.
    struct RecordingRunner {
        calls: Mutex<Vec<RecordedCall>>,
        fail_on: Option<Step>,
    }

    struct RecordedCall {
        project_dir: PathBuf,
        entry_point: String,
        parameters: BTreeMap<String, String>,
        tracking: TrackingContext,
        model_config_existed: bool,
    }

    impl RecordingRunner {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }

        fn failing_on(step: Step) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: Some(step),
            }
        }
    }

    #[async_trait::async_trait]
    impl StepRunner for RecordingRunner {
        async fn invoke(
            &self,
            project_dir: &Path,
            entry_point: &str,
            parameters: &BTreeMap<String, String>,
            tracking: &TrackingContext,
        ) -> Result<RunHandle, DispatchError> {
            let model_config_existed = parameters
                .get("model_config")
                .map(|path| Path::new(path).exists())
                .unwrap_or(false);

            self.calls.lock().unwrap().push(RecordedCall {
                project_dir: project_dir.to_path_buf(),
                entry_point: entry_point.to_string(),
                parameters: parameters.clone(),
                tracking: tracking.clone(),
                model_config_existed,
            });

            if let Some(fail) = self.fail_on {
                if project_dir == fail.dir() {
                    return Err(DispatchError::NonZeroExit {
                        code: 1,
                        stderr: "step blew up".to_string(),
                    });
                }
            }

            Ok(RunHandle::started(format!(
                "run-{}",
                project_dir.display()
            )))
        }
    }

    fn sample_config(steps: &str) -> PipelineConfig {
        PipelineConfig {
            main: MainConfig {
                project_name: "genre_classification".to_string(),
                experiment_name: "dev".to_string(),
                execute_steps: StepsSpec::Csv(steps.to_string()),
                random_seed: 42,
            },
            data: DataConfig {
                file_url: "https://example.com/dataset.parquet".to_string(),
                reference_dataset: "preprocessed_data.csv:latest".to_string(),
                ks_alpha: 0.05,
                test_size: 0.3,
                val_size: 0.3,
                stratify: "genre".to_string(),
            },
            random_forest_pipeline: ModelConfig {
                export_artifact: "model_export".to_string(),
                extra: serde_yaml::from_str("random_forest:\n  n_estimators: 100\n").unwrap(),
            },
        }
    }

    fn pipeline(steps: &str, runner: Arc<RecordingRunner>, work_dir: &Path) -> Pipeline {
        Pipeline::new(sample_config(steps), runner, work_dir)
    }

    #[tokio::test]
    async fn test_steps_dispatch_in_canonical_order() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new());
        let handles = pipeline("evaluate,download,preprocess", runner.clone(), dir.path())
            .run()
            .await
            .unwrap();

        assert_eq!(handles.len(), 3);
        let calls = runner.calls.lock().unwrap();
        let dirs: Vec<_> = calls
            .iter()
            .map(|call| call.project_dir.display().to_string())
            .collect();
        assert_eq!(dirs, vec!["download", "preprocess", "evaluate"]);
        assert!(calls.iter().all(|call| call.entry_point == "main"));
    }

    #[tokio::test]
    async fn test_tracking_context_reaches_every_dispatch() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new());
        pipeline("download", runner.clone(), dir.path())
            .run()
            .await
            .unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(
            calls[0].tracking,
            TrackingContext::new("genre_classification", "dev")
        );
    }

    #[tokio::test]
    async fn test_empty_plan_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new());
        let handles = pipeline("", runner.clone(), dir.path()).run().await.unwrap();

        assert!(handles.is_empty());
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_stops_downstream_steps() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::failing_on(Step::Preprocess));
        let err = pipeline("preprocess,check_data", runner.clone(), dir.path())
            .run()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OrchestratorError::Dispatch {
                step: Step::Preprocess,
                ..
            }
        ));
        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].project_dir, Path::new("preprocess"));
    }

    #[tokio::test]
    async fn test_model_config_is_written_before_training_dispatch() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new());
        pipeline("random_forest", runner.clone(), dir.path())
            .run()
            .await
            .unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].model_config_existed);
        assert_eq!(
            calls[0].parameters["train_data"],
            "dataset_train.csv:latest"
        );
        assert_eq!(
            calls[0].parameters["model_config"],
            dir.path().join(MODEL_CONFIG_FILE).display().to_string()
        );
    }

    #[tokio::test]
    async fn test_materialize_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does_not_exist");
        let runner = Arc::new(RecordingRunner::new());
        let err = pipeline("random_forest", runner.clone(), &missing)
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::Materialize(_)));
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_evaluate_uses_configured_export_artifact() {
        let dir = TempDir::new().unwrap();
        let mut config = sample_config("evaluate");
        config.random_forest_pipeline.export_artifact = "rf_model".to_string();
        let runner = Arc::new(RecordingRunner::new());
        Pipeline::new(config, runner.clone(), dir.path())
            .run()
            .await
            .unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0].parameters["model_export"], "rf_model:latest");
    }
}
