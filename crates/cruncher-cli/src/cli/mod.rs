//! CLI for the cruncher batch conversion scheduler.

mod commands;

use anyhow::Result;
use clap::{ArgGroup, Args, Parser, Subcommand};
use cruncher_core::config;
use std::path::PathBuf;

use commands::{run_jobs, run_plan};

/// Top-level CLI for the cruncher batch conversion scheduler.
#[derive(Debug, Parser)]
#[command(name = "cruncher")]
#[command(
    about = "Batch image conversion scheduler with staged pre/post buffering",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Convert a source tree or run an explicit job list.
    Run(JobArgs),

    /// Print the job list `run` would execute, without running anything.
    Plan(JobArgs),
}

/// Job selection and staging options shared by `run` and `plan`.
#[derive(Debug, Args)]
#[command(group = ArgGroup::new("job_input").required(true).args(["source", "file"]))]
pub struct JobArgs {
    /// Source directory to scan for TIFF inputs.
    #[arg(short = 'p', long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Job-list file, one command line per job.
    #[arg(short = 'f', long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Destination directory for converted files (required with --source).
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Maximum concurrent jobs (default from config, normally 10).
    #[arg(long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Pre-buffer directory: inputs are copied here before a job reads them.
    #[arg(long = "pre-buffer", value_name = "DIR")]
    pub pre_buffer: Option<PathBuf>,

    /// Post-buffer directory: jobs write here, outputs move to dest later.
    #[arg(long = "post-buffer", value_name = "DIR")]
    pub post_buffer: Option<PathBuf>,

    /// Evict the pre-buffer once it reaches this many megabytes.
    #[arg(long = "pre-size", value_name = "MB")]
    pub pre_size: Option<u64>,

    /// Evict the post-buffer once it reaches this many megabytes.
    #[arg(long = "post-size", value_name = "MB")]
    pub post_size: Option<u64>,

    /// Write a completion log (one line per finished command) to this file.
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run(args) => run_jobs(&cfg, &args).await?,
            CliCommand::Plan(args) => run_plan(&cfg, &args)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
