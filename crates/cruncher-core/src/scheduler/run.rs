//! The scheduler's submission loop, capacity waits, and end-of-run drain.

use anyhow::Result;
use std::collections::HashMap;

use crate::execution::{ExecWatch, Execution, PollOutcome};
use crate::jobspec::JobSpec;
use crate::runlog::RunLog;
use crate::staging::StagingEntry;

use super::SchedulerConfig;

/// Identifier of an open staging entry.
pub type EntryId = u64;

/// One tracked external job and the staging entry it is attached to, if any.
pub(super) struct ActiveJob {
    pub(super) exec: Execution,
    pub(super) entry: Option<EntryId>,
}

/// Owns the bounded pool of running executions, the open staging entries,
/// the single pending (not yet attached) entry, and the run log.
pub struct Scheduler {
    pub(super) cfg: SchedulerConfig,
    pub(super) watch: ExecWatch,
    pub(super) log: RunLog,
    pub(super) active: Vec<ActiveJob>,
    pub(super) open: HashMap<EntryId, StagingEntry>,
    pub(super) pending: Option<StagingEntry>,
    next_entry: EntryId,
}

impl Scheduler {
    pub fn new(cfg: SchedulerConfig, log: RunLog) -> Self {
        Scheduler {
            cfg,
            watch: ExecWatch::new(),
            log,
            active: Vec::new(),
            open: HashMap::new(),
            pending: None,
            next_entry: 0,
        }
    }

    /// Submit every spec in order, drain the active set, finalize all open
    /// staging entries, and flush the run log. Returns the number of jobs
    /// actually spawned; a job that cannot be launched is skipped with a
    /// warning, not an error.
    pub async fn run(&mut self, specs: Vec<JobSpec>) -> Result<u32> {
        let buffered = self.cfg.pre.is_some() || self.cfg.post.is_some();
        let mut spawned = 0u32;
        for spec in specs {
            let launched = if buffered && spec.io.is_some() {
                self.submit_staged(spec).await?
            } else {
                self.submit_direct(spec).await
            };
            if launched {
                spawned += 1;
            }
        }
        self.drain().await?;
        self.log.flush()?;
        tracing::info!(jobs = spawned, "run drained and finalized");
        Ok(spawned)
    }

    /// Spawn a spec directly once a concurrency slot is free, independent of
    /// the buffer tiers.
    async fn submit_direct(&mut self, spec: JobSpec) -> bool {
        self.wait_for_slot().await;
        match Execution::spawn(spec.tokens, &self.watch) {
            Ok(exec) => {
                self.active.push(ActiveJob { exec, entry: None });
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "skipping job that could not be launched");
                false
            }
        }
    }

    /// Stage a job through the buffer tiers: create the pending entry and
    /// rewrite the spec at the buffer paths, wait for the pre-copy, run the
    /// eviction checks, then spawn and attach once a slot frees.
    async fn submit_staged(&mut self, mut spec: JobSpec) -> Result<bool> {
        if self.pending.is_none() {
            let Some(io) = spec.io.clone() else {
                return Ok(self.submit_direct(spec).await);
            };
            let pre_dir = self.cfg.pre.as_ref().map(|t| t.dir.clone());
            let post_dir = self.cfg.post.as_ref().map(|t| t.dir.clone());
            let entry = StagingEntry::create(
                &io.input,
                pre_dir.as_deref(),
                post_dir.as_deref(),
                &io.output,
                &self.watch,
            )?;
            self.warn_on_collision(&entry);
            if let Some(path) = entry.pre_path() {
                spec.rewrite_input(path);
            }
            if let Some(path) = entry.post_path() {
                spec.rewrite_output(path);
            }
            self.pending = Some(entry);
        }

        if self.cfg.pre.is_some() {
            while !self.poll_pending_pre_stage() {
                self.watch.completion().await;
            }
        }

        self.evict_post().await?;
        self.evict_pre().await?;
        self.wait_for_slot().await;

        match Execution::spawn(spec.tokens, &self.watch) {
            Ok(exec) => {
                let entry = match self.pending.take() {
                    Some(mut entry) => {
                        entry.attach();
                        let id = self.next_entry;
                        self.next_entry += 1;
                        self.open.insert(id, entry);
                        Some(id)
                    }
                    None => None,
                };
                self.active.push(ActiveJob { exec, entry });
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(error = %err, "skipping staged job that could not be launched");
                // The entry will never get a job; remove its staged copy so
                // the pre-buffer does not fill with orphans.
                if let Some(mut entry) = self.pending.take() {
                    if entry.pre_staged() {
                        entry.clear_pre_stage(&self.watch, &mut self.log).await?;
                    }
                }
                Ok(false)
            }
        }
    }

    /// Poll every active execution once; completed ones are removed from the
    /// active set and their attached entries marked job-complete. Completion
    /// side effects (log record, notification) fire exactly once because an
    /// execution leaves the set the same cycle it is observed complete.
    pub(super) fn update(&mut self) {
        let mut i = 0;
        while i < self.active.len() {
            match self.active[i].exec.poll(&mut self.log) {
                PollOutcome::Pending => i += 1,
                PollOutcome::Completed => {
                    let job = self.active.swap_remove(i);
                    if let Some(id) = job.entry {
                        if let Some(entry) = self.open.get_mut(&id) {
                            entry.mark_job_complete();
                        }
                    }
                }
            }
        }
    }

    /// Suspend until fewer than `max_jobs` executions are active.
    async fn wait_for_slot(&mut self) {
        let max = self.cfg.max_jobs.max(1);
        loop {
            self.update();
            if self.active.len() < max {
                return;
            }
            self.watch.completion().await;
        }
    }

    /// Suspend until the given entry's job has reported completion (or the
    /// entry is gone).
    pub(super) async fn wait_for_entry_job(&mut self, id: EntryId) {
        loop {
            self.update();
            if self.open.get(&id).map_or(true, |e| e.job_complete()) {
                return;
            }
            self.watch.completion().await;
        }
    }

    /// Drain the active set to empty, then finalize every remaining open
    /// entry: staged inputs deleted, staged outputs moved to their final
    /// destinations.
    async fn drain(&mut self) -> Result<()> {
        loop {
            self.update();
            if self.active.is_empty() {
                break;
            }
            self.watch.completion().await;
        }
        let ids: Vec<EntryId> = self.open.keys().copied().collect();
        for id in ids {
            if let Some(mut entry) = self.open.remove(&id) {
                entry.finalize(&self.watch, &mut self.log).await?;
            }
        }
        Ok(())
    }

    fn poll_pending_pre_stage(&mut self) -> bool {
        let Self { pending, log, .. } = self;
        match pending {
            Some(entry) => entry.poll_pre_stage(log),
            None => true,
        }
    }

    /// Buffer files are addressed by base name only; two sources sharing a
    /// base name would overwrite each other in the tier directories.
    fn warn_on_collision(&self, entry: &StagingEntry) {
        let clash = self.open.values().any(|other| {
            (entry.pre_path().is_some() && other.pre_path() == entry.pre_path())
                || (entry.post_path().is_some() && other.post_path() == entry.post_path())
        });
        if clash {
            tracing::warn!(
                source = %entry.source().display(),
                "buffer base-name collision with an open staging entry"
            );
        }
    }

    /// Number of currently running executions.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Number of open staging entries (attached, not yet finalized).
    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// The run log, e.g. to inspect completion records after `run`.
    pub fn log(&self) -> &RunLog {
        &self.log
    }
}
