//! Grading run orchestration.
//!
//! Coordinates candidate loading, fixture generation, the test cases, and
//! report persistence.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use tracker::contract::{FitnessTracker, TRACKER_TYPE};
use tracker::signature::SignatureFailures;

use crate::candidate::{LoadedCandidate, load_candidate};
use crate::cases::{CaseContext, run_all};
use crate::config::GraderConfig;
use crate::fixtures::Fixtures;
use crate::outcome::{CaseId, CaseOutcome};
use crate::report::{
    RunSummary, file_sha256, remove_stale, render_lines, write_report, write_summary,
};

/// Result of one grading run.
#[derive(Debug)]
pub struct GradeOutcome {
    /// Unique identifier for this run.
    pub run_id: String,
    /// One outcome per case, or a single outcome when the tracker type is missing.
    pub outcomes: Vec<CaseOutcome>,
}

impl GradeOutcome {
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.passed)
    }

    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.passed).count()
    }
}

/// Grade the candidate executable at `cfg.solution_path`.
#[instrument(skip_all, fields(solution = %cfg.solution_path.display()))]
pub fn grade_path(cfg: &GraderConfig) -> Result<GradeOutcome> {
    info!("grading run started");
    let started_at = Utc::now();
    remove_stale(&cfg.report_path)?;

    let (outcomes, signature_failures) =
        match load_candidate(&cfg.solution_path, cfg.limits()) {
            LoadedCandidate::Missing { reason } => {
                warn!(reason = %reason, "tracker type missing, skipping cases");
                let outcome = CaseOutcome::fail(
                    CaseId::RegisterUser,
                    format!("{TRACKER_TYPE} type missing ({reason})"),
                );
                (vec![outcome], SignatureFailures::none())
            }
            LoadedCandidate::Ready {
                tracker,
                signature_failures,
            } => {
                let outcomes = grade_cases(&tracker, &signature_failures);
                (outcomes, signature_failures)
            }
        };

    let candidate_sha256 = match file_sha256(&cfg.solution_path) {
        Ok(hash) => Some(hash),
        Err(err) => {
            debug!(err = %format!("{err:#}"), "candidate not hashed");
            None
        }
    };
    let candidate = Candidate {
        label: cfg.solution_path.display().to_string(),
        sha256: candidate_sha256,
    };
    publish(cfg, candidate, started_at, outcomes, &signature_failures)
}

/// Grade a compiled-in candidate; its signatures are checked by the compiler.
#[instrument(skip_all)]
pub fn grade_tracker<T: FitnessTracker>(tracker: &T, cfg: &GraderConfig) -> Result<GradeOutcome> {
    info!("grading run started");
    let started_at = Utc::now();
    remove_stale(&cfg.report_path)?;

    let signature_failures = SignatureFailures::none();
    let outcomes = grade_cases(tracker, &signature_failures);
    let candidate = Candidate {
        label: std::any::type_name::<T>().to_string(),
        sha256: None,
    };
    publish(cfg, candidate, started_at, outcomes, &signature_failures)
}

fn grade_cases(
    tracker: &dyn FitnessTracker,
    signature_failures: &SignatureFailures,
) -> Vec<CaseOutcome> {
    let fixtures = Fixtures::generate();
    debug!(?fixtures, "fixtures generated");
    let ctx = CaseContext {
        tracker,
        signature_failures,
        fixtures: &fixtures,
    };
    run_all(&ctx)
}

/// How the graded candidate is identified in the summary.
struct Candidate {
    label: String,
    sha256: Option<String>,
}

/// Print the report, then persist it and the JSON summary.
fn publish(
    cfg: &GraderConfig,
    candidate: Candidate,
    started_at: DateTime<Utc>,
    outcomes: Vec<CaseOutcome>,
    signature_failures: &SignatureFailures,
) -> Result<GradeOutcome> {
    println!("{}", render_lines(&outcomes));
    write_report(&cfg.report_path, &outcomes).context("write report")?;

    let finished_at = Utc::now();
    let run_id = run_id(started_at);
    let grade = GradeOutcome { run_id, outcomes };
    let summary = RunSummary {
        run_id: grade.run_id.clone(),
        started_at: started_at.to_rfc3339(),
        finished_at: finished_at.to_rfc3339(),
        duration_secs: (finished_at - started_at).num_milliseconds() as f64 / 1000.0,
        candidate: candidate.label,
        candidate_sha256: candidate.sha256,
        signature_failures,
        passed: grade.passed(),
        total: grade.outcomes.len(),
        cases: &grade.outcomes,
    };
    write_summary(&cfg.summary_path, &summary).context("write summary")?;

    info!(
        passed = summary.passed,
        total = summary.total,
        report = %cfg.report_path.display(),
        "grading run complete"
    );
    Ok(grade)
}

fn run_id(started_at: DateTime<Utc>) -> String {
    format!("grade-{}", started_at.format("%Y%m%d_%H%M%S"))
}
