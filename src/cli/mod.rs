//! Command-line interface for mlpipe.
//!
//! Provides commands for running the pipeline and for inspecting the
//! execution plan a configuration resolves to.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli};
