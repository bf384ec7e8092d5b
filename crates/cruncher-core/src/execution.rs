//! One spawned external command, tracked for non-blocking completion.
//!
//! `spawn` launches the command and hands the child to a watcher task that
//! awaits process exit, captures stdout/stderr, and signals the shared
//! `ExecWatch`. The scheduler observes completion through `poll`, which never
//! blocks; waits suspend on the notifier instead of spinning.

use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::sync::Notify;

use crate::error::ExecError;
use crate::runlog::{CompletionRecord, RunLog};

/// Shared completion notifier. Every execution's watcher task signals it on
/// process exit; anything waiting for "some process finished" suspends here.
/// Wake-ups may coalesce, so waiters re-poll after every wake.
#[derive(Debug, Clone, Default)]
pub struct ExecWatch {
    notify: Arc<Notify>,
}

impl ExecWatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspend until at least one execution has completed since the last
    /// wake. Always poll before and after waiting.
    pub async fn completion(&self) {
        self.notify.notified().await;
    }

    fn handle(&self) -> Arc<Notify> {
        Arc::clone(&self.notify)
    }
}

/// Raw capture sent from the watcher task on process exit.
#[derive(Debug)]
struct RawOutput {
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
}

/// Result of a non-blocking completion check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Pending,
    Completed,
}

/// One live external process. Once marked complete the execution is
/// immutable: further polls return `Completed` with no side effects.
#[derive(Debug)]
pub struct Execution {
    tokens: Vec<String>,
    rx: oneshot::Receiver<RawOutput>,
    record: Option<CompletionRecord>,
}

impl Execution {
    /// Launch `tokens` as an external command. Never waits for completion.
    /// Fails with `ExecError::Spawn` if the program cannot be launched.
    pub fn spawn(tokens: Vec<String>, watch: &ExecWatch) -> Result<Execution, ExecError> {
        let (program, args) = tokens.split_first().ok_or(ExecError::EmptyCommand)?;
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: program.clone(),
            source,
        })?;
        tracing::debug!(program = %program, "spawned external command");

        let (tx, rx) = oneshot::channel();
        let notify = watch.handle();
        tokio::spawn(async move {
            let raw = match child.wait_with_output().await {
                Ok(out) => RawOutput {
                    exit_code: out.status.code(),
                    stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
                },
                Err(err) => RawOutput {
                    exit_code: None,
                    stdout: String::new(),
                    stderr: format!("wait failed: {err}"),
                },
            };
            let _ = tx.send(raw);
            notify.notify_one();
        });

        Ok(Execution {
            tokens,
            rx,
            record: None,
        })
    }

    /// Non-blocking completion check. On the first observed completion,
    /// captures output and timestamp, appends exactly one record to `log`,
    /// and returns `Completed`; every later poll returns `Completed` with no
    /// further side effects.
    pub fn poll(&mut self, log: &mut RunLog) -> PollOutcome {
        if self.record.is_some() {
            return PollOutcome::Completed;
        }
        let raw = match self.rx.try_recv() {
            Ok(raw) => raw,
            Err(TryRecvError::Empty) => return PollOutcome::Pending,
            // Watcher task died before sending; treat as completed with no
            // capture so the scheduler can still make progress.
            Err(TryRecvError::Closed) => RawOutput {
                exit_code: None,
                stdout: String::new(),
                stderr: "output channel closed".into(),
            },
        };

        if raw.exit_code != Some(0) {
            tracing::warn!(
                command = ?self.tokens.first(),
                exit_code = ?raw.exit_code,
                stderr = %raw.stderr,
                "external command did not exit cleanly"
            );
        }
        let record = CompletionRecord {
            tokens: self.tokens.clone(),
            stdout: raw.stdout,
            stderr: raw.stderr,
            exit_code: raw.exit_code,
            finished_at: chrono::Local::now(),
        };
        log.append(record.clone());
        self.record = Some(record);
        PollOutcome::Completed
    }

    /// Suspend until this execution completes. Used for the deliberate
    /// synchronous barriers in staging clears.
    pub async fn wait(&mut self, watch: &ExecWatch, log: &mut RunLog) {
        loop {
            if self.poll(log) == PollOutcome::Completed {
                return;
            }
            watch.completion().await;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.record.is_some()
    }

    /// Captured result, available once complete.
    pub fn record(&self) -> Option<&CompletionRecord> {
        self.record.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[tokio::test]
    async fn spawn_empty_command_fails() {
        let watch = ExecWatch::new();
        assert!(matches!(
            Execution::spawn(Vec::new(), &watch),
            Err(ExecError::EmptyCommand)
        ));
    }

    #[tokio::test]
    async fn spawn_missing_program_fails() {
        let watch = ExecWatch::new();
        let result = Execution::spawn(tokens(&["/nonexistent/cruncher-test-tool"]), &watch);
        assert!(matches!(result, Err(ExecError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn poll_logs_exactly_once() {
        let watch = ExecWatch::new();
        let mut log = RunLog::in_memory();
        let mut exec = Execution::spawn(tokens(&["echo", "hello"]), &watch).unwrap();
        exec.wait(&watch, &mut log).await;
        assert!(exec.is_complete());
        // Extra polls after completion must not append more records.
        for _ in 0..3 {
            assert_eq!(exec.poll(&mut log), PollOutcome::Completed);
        }
        assert_eq!(log.records().len(), 1);
        let record = exec.record().unwrap();
        assert_eq!(record.exit_code, Some(0));
        assert_eq!(record.stdout.trim(), "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_still_completes() {
        let watch = ExecWatch::new();
        let mut log = RunLog::in_memory();
        let mut exec =
            Execution::spawn(tokens(&["sh", "-c", "echo oops >&2; exit 3"]), &watch).unwrap();
        exec.wait(&watch, &mut log).await;
        let record = exec.record().unwrap();
        assert_eq!(record.exit_code, Some(3));
        assert_eq!(record.stderr.trim(), "oops");
        assert_eq!(log.records().len(), 1);
    }
}
