//! Pipeline orchestration: step selection, parameter derivation, dispatch.
//!
//! This module is the core of the crate. It turns the configuration into an
//! ordered execution plan, derives each selected step's invocation (including
//! the artifact references that wire one step's output to the next step's
//! input), and dispatches the steps sequentially through a [`StepRunner`].
//!
//! # Pipeline Flow
//!
//! 1. **Selection**: `execute_steps` is intersected with the canonical step
//!    list, preserving dependency order regardless of request order
//! 2. **Derivation**: each selected step's parameters are computed from the
//!    configuration and fixed artifact naming conventions
//! 3. **Materialization**: the training step additionally gets the model
//!    subtree written to a YAML side file
//! 4. **Dispatch**: steps run one at a time; each dispatch call blocks until
//!    the step's process completes, and the first failure aborts the run
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mlpipe::config::ConfigLoader;
//! use mlpipe::pipeline::Pipeline;
//! use mlpipe::runner::MlflowRunner;
//!
//! let config = ConfigLoader::new("config.yaml")
//!     .with_steps("download,preprocess")
//!     .load()?;
//! let runner = Arc::new(MlflowRunner::new("."));
//! let pipeline = Pipeline::new(config, runner, std::env::current_dir()?);
//!
//! let handles = pipeline.run().await?;
//! println!("dispatched {} steps", handles.len());
//! ```
//!
//! [`StepRunner`]: crate::runner::StepRunner

pub mod artifact;
pub mod materialize;
pub mod orchestrator;
pub mod params;
pub mod plan;
pub mod step;

// Re-export main types for convenience
pub use artifact::ArtifactRef;
pub use materialize::{materialize, MaterializeError, MODEL_CONFIG_FILE};
pub use orchestrator::{OrchestratorError, Pipeline};
pub use params::{derive, StepInvocation};
pub use plan::ExecutionPlan;
pub use step::{PipelineArtifact, Step};
