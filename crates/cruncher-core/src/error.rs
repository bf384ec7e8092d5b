//! Error kinds for launching external work.
//!
//! A job that launches but exits non-zero is *not* an error here: completion
//! is always reported and logged, and callers inspect captured output if they
//! care (see `execution`). These variants only cover failures to start.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    /// Command token list was empty; nothing to launch.
    #[error("empty command line")]
    EmptyCommand,

    /// The external program could not be launched (missing executable,
    /// permission denied). Propagated to the caller of spawn, not recovered.
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        source: io::Error,
    },

    /// A staging copy/move/delete sub-command could not be launched. Staging
    /// sub-executions are not separately guarded, so this surfaces as a fault
    /// of the whole run.
    #[error("staging {op} of `{}` could not start: {source}", .path.display())]
    StagingIo {
        op: &'static str,
        path: PathBuf,
        source: Box<ExecError>,
    },
}

impl ExecError {
    /// Wrap a spawn failure from a staging sub-command with the operation
    /// name and the path it was acting on.
    pub(crate) fn staging(op: &'static str, path: &std::path::Path, source: ExecError) -> Self {
        ExecError::StagingIo {
            op,
            path: path.to_path_buf(),
            source: Box::new(source),
        }
    }
}
