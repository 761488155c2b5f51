//! The dispatch boundary to the run-management facility.
//!
//! The orchestrator's responsibility ends at constructing the correct
//! `(step directory, entry point, parameters)` triple; actually launching the
//! step as an isolated, reproducible process is the facility's job. The
//! [`StepRunner`] trait is that seam: the production implementation shells
//! out to the MLflow CLI, tests substitute a recording runner.

pub mod mlflow;

pub use mlflow::MlflowRunner;

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tracking::TrackingContext;

/// Errors reported by the run-management facility.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The facility process could not be launched at all.
    #[error("failed to launch '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The step run exited non-zero (or was killed by a signal).
    #[error("step run exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
}

/// Opaque handle for a dispatched step run.
///
/// The orchestrator never inspects a run beyond this handle; it exists for
/// logging and for reporting what was dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunHandle {
    /// Unique identifier of this run.
    pub run_id: String,
    /// When the run was dispatched.
    pub started_at: DateTime<Utc>,
    /// Wall-clock time the dispatch call blocked for.
    pub duration: Duration,
}

impl RunHandle {
    /// Creates a handle for a run that just started.
    pub fn started(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: Utc::now(),
            duration: Duration::ZERO,
        }
    }

    /// Sets the observed duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Executes one step as an isolated, reproducible run.
///
/// `invoke` is synchronous per step: the returned future resolves only once
/// the step's process has exited, and a non-zero exit surfaces as
/// [`DispatchError`]. The tracking context must be injected into the step's
/// own process environment, never into the caller's.
#[async_trait]
pub trait StepRunner: Send + Sync {
    async fn invoke(
        &self,
        project_dir: &Path,
        entry_point: &str,
        parameters: &BTreeMap<String, String>,
        tracking: &TrackingContext,
    ) -> Result<RunHandle, DispatchError>;
}
