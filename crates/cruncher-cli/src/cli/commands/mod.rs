mod plan;
mod run;

pub use plan::run_plan;
pub use run::run_jobs;

use anyhow::{bail, Result};
use cruncher_core::config::CruncherConfig;
use cruncher_core::jobspec::{self, JobSpec};

use super::JobArgs;

/// Build the job list from either the job-list file or the source tree.
pub(super) fn build_specs(cfg: &CruncherConfig, args: &JobArgs) -> Result<Vec<JobSpec>> {
    if let Some(file) = &args.file {
        return jobspec::load_job_file(file, &cfg.staging_tool);
    }
    if let Some(source) = &args.source {
        let Some(dest) = &args.dest else {
            bail!("--dest is required when converting a source directory");
        };
        return jobspec::scan_source_tree(source, dest, &cfg.staging_tool);
    }
    bail!("either --source or --file is required");
}
