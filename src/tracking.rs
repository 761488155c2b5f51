//! Experiment-tracking identity shared by every step of a run.
//!
//! The tracking backend groups runs by project and run-group names, which it
//! reads from environment variables inside each step's own process. The
//! orchestrator never mutates its own environment: the context travels as a
//! value and the dispatcher injects it into each child process it spawns.

use serde::{Deserialize, Serialize};

use crate::config::MainConfig;

/// Environment variable the tracking backend reads the project name from.
pub const PROJECT_ENV_VAR: &str = "WANDB_PROJECT";

/// Environment variable the tracking backend reads the run-group from.
pub const RUN_GROUP_ENV_VAR: &str = "WANDB_RUN_GROUP";

/// Project and run-group identity injected into every step invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingContext {
    /// Project all runs are recorded under.
    pub project: String,
    /// Group name shared by every step of this pipeline run.
    pub run_group: String,
}

impl TrackingContext {
    /// Creates a context from explicit names.
    pub fn new(project: impl Into<String>, run_group: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            run_group: run_group.into(),
        }
    }

    /// Builds the context from the `main` configuration section.
    pub fn from_config(main: &MainConfig) -> Self {
        Self::new(&main.project_name, &main.experiment_name)
    }

    /// The environment variables to set on a step's child process.
    pub fn env_vars(&self) -> [(&'static str, &str); 2] {
        [
            (PROJECT_ENV_VAR, self.project.as_str()),
            (RUN_GROUP_ENV_VAR, self.run_group.as_str()),
        ]
    }
}
