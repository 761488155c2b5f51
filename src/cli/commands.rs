//! CLI command definitions for mlpipe.
//!
//! Two commands: `run` dispatches the selected steps through MLflow, `plan`
//! shows what a configuration would run without dispatching anything.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use crate::config::{ConfigLoader, PipelineConfig};
use crate::pipeline::Pipeline;
use crate::runner::MlflowRunner;

/// Default configuration file, resolved against the current directory.
const DEFAULT_CONFIG: &str = "config.yaml";

/// ML training pipeline orchestrator.
#[derive(Parser)]
#[command(name = "mlpipe")]
#[command(about = "Run a reproducible ML training pipeline through MLflow")]
#[command(version)]
#[command(
    long_about = "mlpipe reads a declarative pipeline configuration, decides which steps to \
execute, derives each step's parameters (wiring earlier steps' artifacts into later steps' \
inputs), and dispatches every step as an isolated MLflow run.\n\nExample usage:\n  mlpipe run \
--config config.yaml --steps download,preprocess"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Execute the selected pipeline steps sequentially.
    Run(RunArgs),

    /// Resolve and print the execution plan without dispatching anything.
    Plan(PlanArgs),
}

/// Arguments shared by every command that loads the configuration.
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Path to the pipeline configuration file.
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Comma-separated steps to execute, overriding main.execute_steps.
    #[arg(long)]
    pub steps: Option<String>,

    /// Override a configuration field, e.g. --set data.ks_alpha=0.1.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,
}

/// Arguments for `mlpipe run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// MLflow binary used to launch step runs.
    #[arg(long, env = "MLFLOW_BIN", default_value = "mlflow")]
    pub mlflow_bin: PathBuf,

    /// Pipeline root containing the step projects
    /// (default: the configuration file's directory).
    #[arg(long)]
    pub root: Option<PathBuf>,
}

/// Arguments for `mlpipe plan`.
#[derive(Parser, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Also print each step's derived parameters.
    #[arg(long)]
    pub params: bool,

    /// Output the plan as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Parses command-line arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parses arguments and runs the selected command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Runs the selected command with already-parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => cmd_run(args).await,
        Commands::Plan(args) => cmd_plan(args),
    }
}

/// Loads the configuration with all command-line overrides applied.
fn load_config(args: &ConfigArgs) -> anyhow::Result<PipelineConfig> {
    let mut loader = ConfigLoader::new(&args.config).with_raw_overrides(&args.set)?;
    if let Some(steps) = &args.steps {
        loader = loader.with_steps(steps);
    }
    Ok(loader.load()?)
}

/// The directory containing the configuration file, used as pipeline root.
fn config_dir(config: &Path) -> PathBuf {
    config
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

async fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let config = load_config(&args.config)?;
    let root = args
        .root
        .clone()
        .unwrap_or_else(|| config_dir(&args.config.config));

    let runner = MlflowRunner::new(root).with_binary(&args.mlflow_bin);
    let pipeline = Pipeline::new(config, Arc::new(runner), std::env::current_dir()?);

    let handles = pipeline.run().await?;
    info!(steps = handles.len(), "pipeline finished");
    Ok(())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let config = load_config(&args.config)?;
    // The plan never dispatches, so a no-op runner root is fine here.
    let work_dir = std::env::current_dir()?;
    let pipeline = Pipeline::new(
        config,
        Arc::new(MlflowRunner::new(config_dir(&args.config.config))),
        work_dir,
    );

    let plan = pipeline.plan();

    if args.json {
        let payload = if args.params {
            serde_json::json!({
                "steps": plan.steps(),
                "invocations": pipeline.invocations(),
            })
        } else {
            serde_json::json!({ "steps": plan.steps() })
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if plan.is_empty() {
        println!("Execution plan: no steps selected");
        return Ok(());
    }

    println!("Execution plan ({} steps): {}", plan.len(), plan);
    for (step, artifact) in plan.unsatisfied_inputs() {
        println!(
            "  note: {} consumes {} which no earlier selected step produces",
            step, artifact
        );
    }

    if args.params {
        for invocation in pipeline.invocations() {
            println!(
                "\n{} (dir: {}, entry point: {})",
                invocation.step,
                invocation.project_dir.display(),
                invocation.entry_point
            );
            for (key, value) in &invocation.parameters {
                println!("  {} = {}", key, value);
            }
        }
    }

    Ok(())
}
