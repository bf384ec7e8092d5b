//! Flat run log: one record per completed external command.
//!
//! Records are collected in memory during the run and written once, in full,
//! after the scheduler drains, not streamed. Each line is the string form of
//! a 4-tuple: (command tokens, captured stdout, captured stderr, timestamp).
//! This is the user-requested `--log` output; diagnostic logging goes through
//! `tracing` instead.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Everything captured from one finished external command.
#[derive(Debug, Clone)]
pub struct CompletionRecord {
    pub tokens: Vec<String>,
    pub stdout: String,
    pub stderr: String,
    /// Exit code if the process exited normally (None if killed by signal).
    /// Recorded for inspection only; never escalated.
    pub exit_code: Option<i32>,
    pub finished_at: DateTime<Local>,
}

impl CompletionRecord {
    /// One log line: `(tokens, stdout, stderr, timestamp)`.
    pub fn line(&self) -> String {
        format!(
            "({:?}, {:?}, {:?}, {})",
            self.tokens,
            self.stdout,
            self.stderr,
            self.finished_at.format("%Y-%m-%d %H:%M:%S%.6f")
        )
    }
}

/// Append-only completion log, flushed to a file at end of run.
///
/// Passed explicitly into everything that completes executions, so no
/// component needs a back-reference to the scheduler to emit a record.
#[derive(Debug)]
pub struct RunLog {
    path: Option<PathBuf>,
    keep: bool,
    records: Vec<CompletionRecord>,
}

impl RunLog {
    /// Collect records and write them to `path` on `flush`.
    pub fn to_file(path: PathBuf) -> Self {
        RunLog {
            path: Some(path),
            keep: true,
            records: Vec::new(),
        }
    }

    /// Collect records without a backing file (tests, `plan`-style dry runs).
    pub fn in_memory() -> Self {
        RunLog {
            path: None,
            keep: true,
            records: Vec::new(),
        }
    }

    /// Drop every record; used when no `--log` was requested.
    pub fn disabled() -> Self {
        RunLog {
            path: None,
            keep: false,
            records: Vec::new(),
        }
    }

    pub fn append(&mut self, record: CompletionRecord) {
        if self.keep {
            self.records.push(record);
        }
    }

    pub fn records(&self) -> &[CompletionRecord] {
        &self.records
    }

    /// Write all records to the configured file, one line each. No-op when
    /// the log has no backing file.
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut file = fs::File::create(path)
            .with_context(|| format!("failed to create run log {}", path.display()))?;
        for record in &self.records {
            writeln!(file, "{}", record.line())
                .with_context(|| format!("failed to write run log {}", path.display()))?;
        }
        Ok(())
    }
}
