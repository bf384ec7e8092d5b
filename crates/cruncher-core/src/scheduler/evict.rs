//! Size-threshold eviction of the staging tiers.
//!
//! Runs before each staged job is attached. Post eviction moves every open
//! entry's output to its final destination and closes the entry; pre
//! eviction deletes staged input copies that are safe to drop. Both clears
//! block until their sub-commands finish, because the point is to free
//! space before the scheduler continues.

use anyhow::Result;

use crate::staging::size;

use super::run::{EntryId, Scheduler};
use super::BufferTier;

impl Scheduler {
    /// Clear the post-buffer when it has reached its threshold: every open
    /// entry is finalized (pre copy deleted, output moved) and removed.
    /// Each move waits for the producing job first, so the output is never
    /// relocated while the converter is still writing it.
    pub(super) async fn evict_post(&mut self) -> Result<()> {
        let Some((dir, max)) = tier_threshold(&self.cfg.post) else {
            return Ok(());
        };
        if self.open.is_empty() || size::dir_megabytes(&dir) < max as f64 {
            return Ok(());
        }
        tracing::info!(
            dir = %dir.display(),
            entries = self.open.len(),
            "post-buffer threshold reached, evicting open entries"
        );
        let ids: Vec<EntryId> = self.open.keys().copied().collect();
        for id in ids {
            self.wait_for_entry_job(id).await;
            if let Some(mut entry) = self.open.remove(&id) {
                entry.finalize(&self.watch, &mut self.log).await?;
            }
        }
        Ok(())
    }

    /// Clear staged input copies when the pre-buffer has reached its
    /// threshold. Only pre-staged, not-yet-cleared entries qualify; unless
    /// configured otherwise, entries whose job is still running keep their
    /// copy so the converter is never robbed of its input mid-read.
    pub(super) async fn evict_pre(&mut self) -> Result<()> {
        let Some((dir, max)) = tier_threshold(&self.cfg.pre) else {
            return Ok(());
        };
        if size::dir_megabytes(&dir) < max as f64 {
            return Ok(());
        }
        tracing::info!(dir = %dir.display(), "pre-buffer threshold reached, clearing staged inputs");
        self.update();
        let allow_early = self.cfg.evict_pre_before_job_done;
        let ids: Vec<EntryId> = self.open.keys().copied().collect();
        for id in ids {
            if let Some(entry) = self.open.get_mut(&id) {
                if entry.pre_staged()
                    && !entry.pre_cleared()
                    && (allow_early || entry.job_complete())
                {
                    entry.clear_pre_stage(&self.watch, &mut self.log).await?;
                }
            }
        }
        Ok(())
    }
}

fn tier_threshold(tier: &Option<BufferTier>) -> Option<(std::path::PathBuf, u64)> {
    let tier = tier.as_ref()?;
    let max = tier.max_megabytes?;
    Some((tier.dir.clone(), max))
}
