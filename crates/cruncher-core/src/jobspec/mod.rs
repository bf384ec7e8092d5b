//! Job specifications: one external command per unit of work.
//!
//! A `JobSpec` is an ordered token list plus, for staging-eligible jobs,
//! named input/output paths. The scheduler redirects a job at the buffer
//! tiers through `rewrite_input`/`rewrite_output`; it never touches token
//! positions directly, so the external tool's argument grammar stays the
//! parser's business.

mod parse;
mod scan;

pub use parse::{load_job_file, parse_job_line};
pub use scan::scan_source_tree;

use std::path::{Path, PathBuf};

/// Input/output paths of a staging-eligible job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobIo {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// One unit of work: the command tokens, immutable except for buffer-path
/// rewrites, and optional named io paths. `io` is `Some` only for jobs the
/// parser recognized as staging-eligible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub tokens: Vec<String>,
    pub io: Option<JobIo>,
}

impl JobSpec {
    /// Command without staging io (spawned directly, buffers or not).
    pub fn direct(tokens: Vec<String>) -> Self {
        JobSpec { tokens, io: None }
    }

    /// Redirect the job's input at `new` (a pre-buffer copy): replaces the
    /// token holding the current input path and updates the io field.
    pub fn rewrite_input(&mut self, new: &Path) {
        if let Some(io) = &mut self.io {
            rewrite_token(&mut self.tokens, &io.input, new);
            io.input = new.to_path_buf();
        }
    }

    /// Redirect the job's output at `new` (a post-buffer slot).
    pub fn rewrite_output(&mut self, new: &Path) {
        if let Some(io) = &mut self.io {
            rewrite_token(&mut self.tokens, &io.output, new);
            io.output = new.to_path_buf();
        }
    }
}

fn rewrite_token(tokens: &mut [String], old: &Path, new: &Path) {
    let old = old.to_string_lossy();
    if let Some(token) = tokens.iter_mut().find(|t| t.as_str() == old) {
        *token = new.to_string_lossy().into_owned();
    }
}
