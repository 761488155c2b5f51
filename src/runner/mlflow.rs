//! Dispatches steps through the MLflow CLI.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};
use uuid::Uuid;

use crate::tracking::TrackingContext;

use super::{DispatchError, RunHandle, StepRunner};

/// Maximum stderr length carried into a dispatch error.
const STDERR_LIMIT: usize = 4000;

/// Runs steps with `mlflow run <project> -e <entry point> -P key=value`.
///
/// Each step project lives in its own directory under the pipeline root;
/// MLflow takes care of the isolated environment and of recording the run.
/// The tracking context is injected into the child process environment only.
pub struct MlflowRunner {
    binary: PathBuf,
    root: PathBuf,
}

impl MlflowRunner {
    /// Creates a runner for step projects under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            binary: PathBuf::from("mlflow"),
            root: root.into(),
        }
    }

    /// Overrides the MLflow binary (default: `mlflow` on `PATH`).
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Builds the argument list for one step run.
    fn build_args(
        &self,
        project_dir: &Path,
        entry_point: &str,
        parameters: &BTreeMap<String, String>,
    ) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            self.root.join(project_dir).display().to_string(),
            "-e".to_string(),
            entry_point.to_string(),
        ];
        for (key, value) in parameters {
            args.push("-P".to_string());
            args.push(format!("{}={}", key, value));
        }
        args
    }
}

#[async_trait]
impl StepRunner for MlflowRunner {
    async fn invoke(
        &self,
        project_dir: &Path,
        entry_point: &str,
        parameters: &BTreeMap<String, String>,
        tracking: &TrackingContext,
    ) -> Result<RunHandle, DispatchError> {
        let run_id = format!("run-{}", Uuid::new_v4());
        let args = self.build_args(project_dir, entry_point, parameters);
        debug!(
            run_id = %run_id,
            command = %format!("{} {}", self.binary.display(), args.join(" ")),
            "launching step run"
        );

        let handle = RunHandle::started(run_id);
        let start = Instant::now();

        let output = Command::new(&self.binary)
            .args(&args)
            .envs(tracking.env_vars())
            .output()
            .await
            .map_err(|source| DispatchError::Spawn {
                command: self.binary.display().to_string(),
                source,
            })?;

        let duration = start.elapsed();

        if !output.status.success() {
            let stderr = truncate(String::from_utf8_lossy(&output.stderr).into_owned());
            return Err(DispatchError::NonZeroExit {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        info!(run_id = %handle.run_id, elapsed = ?duration, "step run finished");
        Ok(handle.with_duration(duration))
    }
}

/// Truncates captured stderr to a manageable length.
fn truncate(s: String) -> String {
    if s.len() <= STDERR_LIMIT {
        s
    } else {
        format!("{}... [truncated]", &s[..STDERR_LIMIT])
    }
}
