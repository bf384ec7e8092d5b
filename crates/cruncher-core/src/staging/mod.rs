//! Staging cache: one entry per file moving through the buffer tiers.
//!
//! A `StagingEntry` tracks one file's journey: source → pre-buffer copy →
//! (job reads the copy, writes into the post-buffer) → post-buffer → final
//! destination. Either tier is optional. The pre-copy is spawned by the
//! `create` factory so the side effect is visible at the call site; the
//! clears are deliberate synchronous barriers because eviction must free
//! space before the scheduler continues.

pub mod ops;
pub mod size;

use std::path::{Path, PathBuf};

use crate::error::ExecError;
use crate::execution::{ExecWatch, Execution, PollOutcome};
use crate::runlog::RunLog;

/// Tracks one file staged through the optional pre/post buffer tiers.
///
/// Buffer paths address files by base name; sources from different
/// subdirectories sharing a base name collide (the scheduler warns).
#[derive(Debug)]
pub struct StagingEntry {
    source: PathBuf,
    final_path: PathBuf,
    pre_path: Option<PathBuf>,
    post_path: Option<PathBuf>,
    pre_copy: Option<Execution>,
    pre_staged: bool,
    pre_cleared: bool,
    attached: bool,
    job_done: bool,
}

impl StagingEntry {
    /// Create an entry and, when a pre-buffer is configured, immediately
    /// spawn the copy of `source` into it under the source's base name.
    /// Without a pre-buffer the entry is born already staged.
    pub fn create(
        source: &Path,
        pre_dir: Option<&Path>,
        post_dir: Option<&Path>,
        final_path: &Path,
        watch: &ExecWatch,
    ) -> Result<StagingEntry, ExecError> {
        let pre_path = pre_dir.map(|dir| dir.join(base_name(source)));
        let post_path = post_dir.map(|dir| dir.join(base_name(final_path)));

        let pre_copy = match &pre_path {
            Some(dst) => {
                let exec = Execution::spawn(ops::copy_tokens(source, dst), watch)
                    .map_err(|err| ExecError::staging("copy", source, err))?;
                Some(exec)
            }
            None => None,
        };
        let pre_staged = pre_copy.is_none();

        Ok(StagingEntry {
            source: source.to_path_buf(),
            final_path: final_path.to_path_buf(),
            pre_path,
            post_path,
            pre_copy,
            pre_staged,
            pre_cleared: false,
            attached: false,
            job_done: false,
        })
    }

    /// Poll the pre-stage copy; sets the pre-stage-complete flag on
    /// completion. Always `true` when no pre-buffer is configured.
    pub fn poll_pre_stage(&mut self, log: &mut RunLog) -> bool {
        if self.pre_staged {
            return true;
        }
        if let Some(copy) = &mut self.pre_copy {
            if copy.poll(log) == PollOutcome::Completed {
                self.pre_staged = true;
            }
        }
        self.pre_staged
    }

    /// Bind the entry to its job execution. The job itself lives in the
    /// scheduler's active set; the entry only records the binding so the
    /// lifecycle invariants hold.
    pub fn attach(&mut self) {
        assert!(
            self.pre_staged,
            "staging entry attached before its pre-stage copy completed"
        );
        assert!(!self.attached, "staging entry attached twice");
        self.attached = true;
    }

    /// Completion notification from the bound job execution.
    pub fn mark_job_complete(&mut self) {
        self.job_done = true;
    }

    /// Delete the staged input copy from the pre-buffer and wait for the
    /// delete to finish. Idempotent once cleared; no-op without a pre-buffer.
    pub async fn clear_pre_stage(
        &mut self,
        watch: &ExecWatch,
        log: &mut RunLog,
    ) -> Result<(), ExecError> {
        let Some(path) = &self.pre_path else {
            return Ok(());
        };
        assert!(
            self.pre_staged,
            "pre-buffer clear before the pre-stage copy completed"
        );
        if self.pre_cleared {
            return Ok(());
        }
        let mut delete = Execution::spawn(ops::delete_tokens(path), watch)
            .map_err(|err| ExecError::staging("delete", path, err))?;
        delete.wait(watch, log).await;
        self.pre_cleared = true;
        tracing::debug!(path = %path.display(), "cleared pre-buffer copy");
        Ok(())
    }

    /// Move the staged output from the post-buffer to its final destination
    /// and wait for the move to finish. No-op without a post-buffer.
    pub async fn clear_post_stage(
        &mut self,
        watch: &ExecWatch,
        log: &mut RunLog,
    ) -> Result<(), ExecError> {
        let Some(path) = &self.post_path else {
            return Ok(());
        };
        assert!(
            self.job_done,
            "post-buffer clear before the job reported completion"
        );
        let mut mv = Execution::spawn(ops::move_tokens(path, &self.final_path), watch)
            .map_err(|err| ExecError::staging("move", path, err))?;
        mv.wait(watch, log).await;
        tracing::debug!(
            from = %path.display(),
            to = %self.final_path.display(),
            "moved staged output to final destination"
        );
        Ok(())
    }

    /// Pre-buffer delete then post-buffer move, as applicable. Used during
    /// end-of-run drain and post eviction.
    pub async fn finalize(&mut self, watch: &ExecWatch, log: &mut RunLog) -> Result<(), ExecError> {
        if self.pre_path.is_some() {
            self.clear_pre_stage(watch, log).await?;
        }
        if self.post_path.is_some() {
            self.clear_post_stage(watch, log).await?;
        }
        Ok(())
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn pre_path(&self) -> Option<&Path> {
        self.pre_path.as_deref()
    }

    pub fn post_path(&self) -> Option<&Path> {
        self.post_path.as_deref()
    }

    pub fn pre_staged(&self) -> bool {
        self.pre_staged
    }

    pub fn pre_cleared(&self) -> bool {
        self.pre_cleared
    }

    pub fn job_complete(&self) -> bool {
        self.job_done
    }
}

fn base_name(path: &Path) -> PathBuf {
    path.file_name().map(PathBuf::from).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_pre_buffer_is_born_staged() {
        let watch = ExecWatch::new();
        let mut log = RunLog::in_memory();
        let mut entry = StagingEntry::create(
            Path::new("/src/a.tif"),
            None,
            Some(Path::new("/post")),
            Path::new("/out/a.jpg"),
            &watch,
        )
        .unwrap();
        assert!(entry.poll_pre_stage(&mut log));
        assert!(entry.pre_path().is_none());
        assert_eq!(entry.post_path(), Some(Path::new("/post/a.jpg")));
        entry.attach();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn pre_copy_lands_under_base_name() {
        let src_dir = tempfile::tempdir().unwrap();
        let pre_dir = tempfile::tempdir().unwrap();
        let src = src_dir.path().join("a.tif");
        std::fs::write(&src, b"pixels").unwrap();

        let watch = ExecWatch::new();
        let mut log = RunLog::in_memory();
        let mut entry =
            StagingEntry::create(&src, Some(pre_dir.path()), None, Path::new("/out/a.jpg"), &watch)
                .unwrap();
        assert_eq!(entry.pre_path(), Some(pre_dir.path().join("a.tif").as_path()));
        while !entry.poll_pre_stage(&mut log) {
            watch.completion().await;
        }
        assert_eq!(std::fs::read(pre_dir.path().join("a.tif")).unwrap(), b"pixels");
        assert_eq!(log.records().len(), 1);

        entry.attach();
        entry.clear_pre_stage(&watch, &mut log).await.unwrap();
        assert!(!pre_dir.path().join("a.tif").exists());
        assert!(entry.pre_cleared());
        // Second clear is a no-op: no extra delete command is logged.
        entry.clear_pre_stage(&watch, &mut log).await.unwrap();
        assert_eq!(log.records().len(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn post_move_reaches_final_destination() {
        let post_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let final_path = out_dir.path().join("a.jpg");
        std::fs::write(post_dir.path().join("a.jpg"), b"jpeg").unwrap();

        let watch = ExecWatch::new();
        let mut log = RunLog::in_memory();
        let mut entry = StagingEntry::create(
            Path::new("/src/a.tif"),
            None,
            Some(post_dir.path()),
            &final_path,
            &watch,
        )
        .unwrap();
        entry.attach();
        entry.mark_job_complete();
        entry.clear_post_stage(&watch, &mut log).await.unwrap();
        assert_eq!(std::fs::read(&final_path).unwrap(), b"jpeg");
        assert!(!post_dir.path().join("a.jpg").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    #[should_panic(expected = "attached before its pre-stage copy")]
    async fn attach_before_pre_stage_is_fatal() {
        let src_dir = tempfile::tempdir().unwrap();
        let pre_dir = tempfile::tempdir().unwrap();
        let src = src_dir.path().join("a.tif");
        std::fs::write(&src, b"pixels").unwrap();

        let watch = ExecWatch::new();
        let mut entry =
            StagingEntry::create(&src, Some(pre_dir.path()), None, Path::new("/out/a.jpg"), &watch)
                .unwrap();
        entry.attach();
    }

    #[tokio::test]
    #[should_panic(expected = "post-buffer clear before the job")]
    async fn post_clear_before_job_complete_is_fatal() {
        let watch = ExecWatch::new();
        let mut log = RunLog::in_memory();
        let mut entry = StagingEntry::create(
            Path::new("/src/a.tif"),
            None,
            Some(Path::new("/post")),
            Path::new("/out/a.jpg"),
            &watch,
        )
        .unwrap();
        entry.attach();
        let _ = entry.clear_post_stage(&watch, &mut log).await;
    }
}
