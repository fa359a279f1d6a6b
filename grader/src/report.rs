//! Report persistence.
//!
//! The text report is the grading artifact: one line per case, newline-joined
//! with a trailing newline. The JSON summary records the same outcomes with
//! run metadata for later inspection.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracker::signature::SignatureFailures;

use crate::outcome::CaseOutcome;

/// Metadata for one grading run, persisted as JSON.
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub duration_secs: f64,
    pub candidate: String,
    /// SHA-256 of the candidate file, when it could be read.
    pub candidate_sha256: Option<String>,
    pub signature_failures: &'a SignatureFailures,
    pub passed: usize,
    pub total: usize,
    pub cases: &'a [CaseOutcome],
}

/// Render outcomes as report text.
pub fn render_lines(outcomes: &[CaseOutcome]) -> String {
    outcomes
        .iter()
        .map(CaseOutcome::line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace any previous report at `path` with `outcomes`.
pub fn write_report(path: &Path, outcomes: &[CaseOutcome]) -> Result<()> {
    ensure_parent(path)?;
    remove_stale(path)?;
    fs::write(path, format!("{}\n", render_lines(outcomes)))
        .with_context(|| format!("write report {}", path.display()))?;
    Ok(())
}

/// Remove a report left by an earlier run.
pub fn remove_stale(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("remove stale {}", path.display())),
    }
}

pub fn write_summary(path: &Path, summary: &RunSummary<'_>) -> Result<()> {
    ensure_parent(path)?;
    let contents = serde_json::to_string_pretty(summary).context("serialize summary")?;
    fs::write(path, format!("{contents}\n"))
        .with_context(|| format!("write summary {}", path.display()))?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    Ok(())
}

pub fn file_sha256(path: &Path) -> Result<String> {
    let contents = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let digest = hasher.finalize();
    Ok(hex::encode(digest))
}
