//! Candidate loading and the out-of-process [`FitnessTracker`] adapter.
//!
//! A candidate on disk is an executable speaking the `tracker::protocol`
//! wire format. Loading runs its `describe` handshake once and verifies the
//! declared signatures; every later operation is a fresh `call` process.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument, warn};
use tracker::contract::{
    CALCULATE_AVERAGE_CALORIES, FitnessTracker, GENERATE_PROGRESS_REPORT, LOG_WORKOUT,
    REGISTER_USER, TRACKER_TYPE,
};
use tracker::model::{FitnessData, ProgressReport};
use tracker::protocol::{CALL_COMMAND, CallReply, CallRequest, CallResponse, DESCRIBE_COMMAND};
use tracker::signature::{Manifest, SignatureFailures, verify_manifest};

use crate::process::{CallLimits, run_with_limits};

/// Result of loading a candidate from disk.
#[derive(Debug)]
pub enum LoadedCandidate {
    /// The candidate exposes the tracker type; some operations may still mismatch.
    Ready {
        tracker: ProcessTracker,
        signature_failures: SignatureFailures,
    },
    /// The tracker type is absent; grading short-circuits.
    Missing { reason: String },
}

/// A candidate executable graded through the process protocol.
#[derive(Debug, Clone)]
pub struct ProcessTracker {
    program: PathBuf,
    limits: CallLimits,
}

impl ProcessTracker {
    pub fn new(program: PathBuf, limits: CallLimits) -> Self {
        Self { program, limits }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run the `describe` handshake.
    pub fn describe(&self) -> Result<Manifest> {
        let mut cmd = Command::new(&self.program);
        cmd.arg(DESCRIBE_COMMAND);
        let output = run_with_limits(cmd, None, self.limits)?;
        if let Some(failure) = output.failure(self.limits) {
            return Err(anyhow!(failure));
        }
        serde_json::from_slice(&output.stdout.bytes).context("parse manifest")
    }

    #[instrument(skip(self, request), fields(program = %self.program.display()))]
    fn call(&self, operation: &str, request: &CallRequest) -> Result<CallReply> {
        let input = serde_json::to_vec(request).context("serialize call request")?;
        let mut cmd = Command::new(&self.program);
        cmd.arg(CALL_COMMAND).arg(operation);
        let output = run_with_limits(cmd, Some(&input), self.limits)?;
        if let Some(failure) = output.failure(self.limits) {
            debug!(failure = %failure, "candidate call failed");
            return Err(anyhow!(failure));
        }
        let response: CallResponse = serde_json::from_slice(&output.stdout.bytes)
            .with_context(|| format!("parse {operation} response"))?;
        response.into_reply()
    }

    /// Call a mutating operation, write the candidate's view of the input
    /// dataset back into the caller's, and return the reply value.
    fn call_mutating(
        &self,
        operation: &str,
        fitness_data: &mut FitnessData,
        request: CallRequest,
    ) -> Result<FitnessData> {
        let reply = self.call(operation, &request)?;
        let returned = reply.decode_value::<FitnessData>()?;
        if let Some(updated) = reply.fitness_data {
            *fitness_data = updated;
        }
        Ok(returned)
    }
}

impl FitnessTracker for ProcessTracker {
    fn register_user(
        &self,
        fitness_data: &mut FitnessData,
        user_name: &str,
    ) -> Result<FitnessData> {
        let request = CallRequest::new(fitness_data).user(user_name);
        self.call_mutating(REGISTER_USER, fitness_data, request)
    }

    fn log_workout(
        &self,
        fitness_data: &mut FitnessData,
        user_name: &str,
        calories_burned: f64,
    ) -> Result<FitnessData> {
        let request = CallRequest::new(fitness_data)
            .user(user_name)
            .calories(calories_burned);
        self.call_mutating(LOG_WORKOUT, fitness_data, request)
    }

    fn calculate_average_calories(
        &self,
        fitness_data: &FitnessData,
        user_name: &str,
    ) -> Result<f64> {
        let request = CallRequest::new(fitness_data).user(user_name);
        self.call(CALCULATE_AVERAGE_CALORIES, &request)?
            .decode_value()
    }

    fn generate_progress_report(&self, fitness_data: &FitnessData) -> Result<ProgressReport> {
        let request = CallRequest::new(fitness_data);
        self.call(GENERATE_PROGRESS_REPORT, &request)?
            .decode_value()
    }
}

/// Load the candidate at `path` and verify its declared signatures.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_candidate(path: &Path, limits: CallLimits) -> LoadedCandidate {
    let program = match fs::canonicalize(path) {
        Ok(program) => program,
        Err(err) => {
            warn!(err = %err, "candidate not found");
            return LoadedCandidate::Missing {
                reason: format!("no candidate at {} ({err})", path.display()),
            };
        }
    };

    let tracker = ProcessTracker::new(program, limits);
    let manifest = match tracker.describe() {
        Ok(manifest) => manifest,
        Err(err) => {
            warn!(err = %format!("{err:#}"), "describe handshake failed");
            return LoadedCandidate::Missing {
                reason: format!("describe failed: {err:#}"),
            };
        }
    };

    if !manifest.declares_tracker_type() {
        return LoadedCandidate::Missing {
            reason: format!(
                "candidate declares '{}' instead of '{TRACKER_TYPE}'",
                manifest.type_name
            ),
        };
    }

    let signature_failures = verify_manifest(&manifest);
    info!(
        signature_failures = signature_failures.len(),
        "candidate loaded"
    );
    LoadedCandidate::Ready {
        tracker,
        signature_failures,
    }
}
