//! Diagnostic logging init: file under the XDG state dir, or stderr.
//!
//! This is the `tracing` side of logging; the flat per-run completion log
//! lives in `runlog` and is written only when the user asks for it.

use anyhow::Result;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Writer target for one log line; falls back to stderr when the log file
/// handle cannot be duplicated.
enum LogTarget {
    File(fs::File),
    Stderr,
}

impl io::Write for LogTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogTarget::File(f) => f.write(buf),
            LogTarget::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogTarget::File(f) => f.flush(),
            LogTarget::Stderr => io::stderr().lock().flush(),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,cruncher=debug"))
}

/// Initialize structured logging to `~/.local/state/cruncher/cruncher.log`.
/// Returns Err if the state dir is unusable so the caller can fall back to
/// `init_logging_stderr`.
pub fn init_logging() -> Result<()> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("cruncher")?;
    let log_dir = xdg_dirs.get_state_home().join("cruncher");
    fs::create_dir_all(&log_dir)?;
    let log_path: PathBuf = log_dir.join("cruncher.log");

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    struct FileMakeWriter(fs::File);

    impl<'a> MakeWriter<'a> for FileMakeWriter {
        type Writer = LogTarget;

        fn make_writer(&'a self) -> Self::Writer {
            self.0
                .try_clone()
                .map(LogTarget::File)
                .unwrap_or(LogTarget::Stderr)
        }
    }

    let writer: BoxMakeWriter = BoxMakeWriter::new(FileMakeWriter(file));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .init();

    tracing::debug!("logging initialized at {}", log_path.display());
    Ok(())
}

/// Stderr-only logging; used when `init_logging` fails so the CLI still runs.
pub fn init_logging_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}
