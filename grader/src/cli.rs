//! CLI command implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;
use tracker::signature::Manifest;

use crate::config::{Overrides, discover_config};
use crate::exit_codes;
use crate::run::grade_path;

/// Arguments of `grader run`.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub solution: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub summary: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub config: Option<PathBuf>,
}

/// Grade a candidate and map the result to an exit code.
pub fn run_grading(workdir: &Path, args: RunArgs) -> Result<i32> {
    let config_path = args.config.map(|path| workdir.join(path));
    let overrides = Overrides {
        solution_path: args.solution.map(|path| workdir.join(path)),
        report_path: args.report.map(|path| workdir.join(path)),
        summary_path: args.summary.map(|path| workdir.join(path)),
        call_timeout_secs: args.timeout_secs,
    };
    let cfg = discover_config(workdir, config_path.as_deref())
        .context("load config")?
        .with_overrides(overrides)?;
    debug!(?cfg, "config resolved");

    let grade = grade_path(&cfg)?;
    eprintln!(
        "grade: run={} passed={}/{} report={}",
        grade.run_id,
        grade.passed(),
        grade.outcomes.len(),
        cfg.report_path.display()
    );
    Ok(if grade.all_passed() {
        exit_codes::OK
    } else {
        exit_codes::FAILED
    })
}

/// Print the manifest a conforming candidate must declare.
pub fn print_contract() -> Result<()> {
    let manifest = serde_json::to_string_pretty(&Manifest::expected())
        .context("serialize manifest")?;
    println!("{manifest}");
    Ok(())
}
