//! `cruncher plan` – show the job list without executing it.

use anyhow::Result;
use cruncher_core::config::CruncherConfig;

use super::super::JobArgs;
use super::build_specs;

pub fn run_plan(cfg: &CruncherConfig, args: &JobArgs) -> Result<()> {
    let specs = build_specs(cfg, args)?;
    for spec in &specs {
        let marker = if spec.io.is_some() { "staged" } else { "direct" };
        println!("[{}] {}", marker, spec.tokens.join(" "));
    }
    println!("{} job(s) planned", specs.len());
    Ok(())
}
