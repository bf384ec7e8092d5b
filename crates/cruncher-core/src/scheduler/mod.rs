//! Bounded-concurrency job scheduler.
//!
//! Consumes job specs in order, keeps at most `max_jobs` external processes
//! running, shepherds staging-eligible jobs through the optional pre/post
//! buffer tiers, and evicts the tiers by size threshold. Single control
//! task: completions are observed through non-blocking polls, and every
//! wait suspends on the shared `ExecWatch` notifier.
//!
//! Known gap: no cancellation or timeout; once spawned, a job runs to
//! completion.

mod evict;
mod run;

pub use run::{EntryId, Scheduler};

use std::path::PathBuf;

/// One staging tier: its directory and the size threshold (decimal MB) at
/// which it is evicted. `None` disables eviction for the tier.
#[derive(Debug, Clone)]
pub struct BufferTier {
    pub dir: PathBuf,
    pub max_megabytes: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum concurrently running external jobs.
    pub max_jobs: usize,
    /// Pre-buffer tier: inputs are copied here before the job reads them.
    pub pre: Option<BufferTier>,
    /// Post-buffer tier: jobs write here; outputs move to their final path.
    pub post: Option<BufferTier>,
    /// Evict pre-buffer copies as soon as they are staged, even while the
    /// consuming job may still be reading (the original behavior). Off by
    /// default: eviction waits for the job to finish with its input.
    pub evict_pre_before_job_done: bool,
}

impl SchedulerConfig {
    /// Plain bounded-concurrency scheduling with no staging tiers.
    pub fn direct(max_jobs: usize) -> Self {
        SchedulerConfig {
            max_jobs,
            pre: None,
            post: None,
            evict_pre_before_job_done: false,
        }
    }
}
