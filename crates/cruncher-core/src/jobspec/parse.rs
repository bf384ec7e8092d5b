//! Job-list file parsing.
//!
//! One command per line, whitespace-separated tokens. A trailing
//! `>> somefile` shell redirection is stripped. Lines whose program token is
//! the configured staging tool carry their input and output paths at fixed
//! positions of that tool's argument grammar; those become the job's named
//! io fields. Anything else is a direct job.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::{JobIo, JobSpec};

/// Input path position in the staging tool's argument grammar
/// (`tool convert INPUT ... OUTPUT`).
pub const INPUT_TOKEN: usize = 2;
/// Output path position in the staging tool's argument grammar.
pub const OUTPUT_TOKEN: usize = 7;

/// Parse one job-list line. Returns `None` for blank lines.
pub fn parse_job_line(line: &str, staging_tool: &str) -> Option<JobSpec> {
    let mut tokens: Vec<String> = line.split_whitespace().map(str::to_owned).collect();
    if tokens.is_empty() {
        return None;
    }
    if tokens.len() >= 2 && tokens[tokens.len() - 2] == ">>" {
        tokens.truncate(tokens.len() - 2);
    }

    let io = if tokens[0] == staging_tool && tokens.len() > OUTPUT_TOKEN {
        Some(JobIo {
            input: PathBuf::from(&tokens[INPUT_TOKEN]),
            output: PathBuf::from(&tokens[OUTPUT_TOKEN]),
        })
    } else {
        None
    };
    Some(JobSpec { tokens, io })
}

/// Load a job-list file, one spec per non-blank line, in file order.
pub fn load_job_file(path: &Path, staging_tool: &str) -> Result<Vec<JobSpec>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read job list {}", path.display()))?;
    Ok(text
        .lines()
        .filter_map(|line| parse_job_line(line, staging_tool))
        .collect())
}
