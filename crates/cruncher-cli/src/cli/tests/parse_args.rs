//! Tests for run/plan argument parsing.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::Path;

#[test]
fn cli_parse_run_with_source() {
    match parse(&["cruncher", "run", "-p", "/in", "--dest", "/out"]) {
        CliCommand::Run(args) => {
            assert_eq!(args.source.as_deref(), Some(Path::new("/in")));
            assert_eq!(args.dest.as_deref(), Some(Path::new("/out")));
            assert!(args.file.is_none());
            assert!(args.jobs.is_none());
            assert!(args.log.is_none());
        }
        _ => panic!("expected Run"),
    }
}

#[test]
fn cli_parse_run_with_job_file() {
    match parse(&["cruncher", "run", "-f", "/tmp/jobs.txt", "--jobs", "4"]) {
        CliCommand::Run(args) => {
            assert_eq!(args.file.as_deref(), Some(Path::new("/tmp/jobs.txt")));
            assert_eq!(args.jobs, Some(4));
        }
        _ => panic!("expected Run with -f"),
    }
}

#[test]
fn cli_parse_run_with_buffers() {
    match parse(&[
        "cruncher",
        "run",
        "-f",
        "jobs.txt",
        "--pre-buffer",
        "/fast/pre",
        "--post-buffer",
        "/fast/post",
        "--pre-size",
        "512",
        "--post-size",
        "1024",
        "--log",
        "run.log",
    ]) {
        CliCommand::Run(args) => {
            assert_eq!(args.pre_buffer.as_deref(), Some(Path::new("/fast/pre")));
            assert_eq!(args.post_buffer.as_deref(), Some(Path::new("/fast/post")));
            assert_eq!(args.pre_size, Some(512));
            assert_eq!(args.post_size, Some(1024));
            assert_eq!(args.log.as_deref(), Some(Path::new("run.log")));
        }
        _ => panic!("expected Run with buffer options"),
    }
}

#[test]
fn cli_parse_plan() {
    match parse(&["cruncher", "plan", "-p", "/in", "--dest", "/out"]) {
        CliCommand::Plan(args) => {
            assert_eq!(args.source.as_deref(), Some(Path::new("/in")));
        }
        _ => panic!("expected Plan"),
    }
}

#[test]
fn cli_requires_source_or_file() {
    assert!(Cli::try_parse_from(["cruncher", "run"]).is_err());
}

#[test]
fn cli_rejects_source_and_file_together() {
    assert!(Cli::try_parse_from(["cruncher", "run", "-p", "/in", "-f", "jobs.txt"]).is_err());
}
