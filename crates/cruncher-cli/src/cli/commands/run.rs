//! `cruncher run` – schedule and execute the job list.

use anyhow::{Context, Result};
use cruncher_core::config::CruncherConfig;
use cruncher_core::runlog::RunLog;
use cruncher_core::scheduler::{BufferTier, Scheduler, SchedulerConfig};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use super::super::JobArgs;
use super::build_specs;

pub async fn run_jobs(cfg: &CruncherConfig, args: &JobArgs) -> Result<()> {
    let specs = build_specs(cfg, args)?;
    if specs.is_empty() {
        println!("nothing to do");
        return Ok(());
    }
    prepare_directories(args, &specs)?;

    let sched_cfg = SchedulerConfig {
        max_jobs: args.jobs.unwrap_or(cfg.max_jobs),
        pre: buffer_tier(&args.pre_buffer, args.pre_size),
        post: buffer_tier(&args.post_buffer, args.post_size),
        evict_pre_before_job_done: cfg.evict_pre_before_job_done,
    };
    let log = match &args.log {
        Some(path) => RunLog::to_file(path.clone()),
        None => RunLog::disabled(),
    };

    let started = Instant::now();
    let mut scheduler = Scheduler::new(sched_cfg, log);
    let spawned = scheduler.run(specs).await?;
    println!(
        "{} job(s) completed in {:.1}s",
        spawned,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

fn buffer_tier(dir: &Option<PathBuf>, max_megabytes: Option<u64>) -> Option<BufferTier> {
    dir.as_ref().map(|dir| BufferTier {
        dir: dir.clone(),
        max_megabytes,
    })
}

/// Create the buffer directories and every job's destination parent before
/// anything runs, so staging moves never fail on a missing directory.
fn prepare_directories(
    args: &JobArgs,
    specs: &[cruncher_core::jobspec::JobSpec],
) -> Result<()> {
    for dir in [&args.pre_buffer, &args.post_buffer].into_iter().flatten() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create buffer directory {}", dir.display()))?;
    }
    for spec in specs {
        if let Some(io) = &spec.io {
            if let Some(parent) = io.output.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create destination directory {}", parent.display())
                })?;
            }
        }
    }
    Ok(())
}
