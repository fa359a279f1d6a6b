//! The behavioral contract every graded candidate must satisfy.
//!
//! A compiled-in candidate implements [`FitnessTracker`] directly and the
//! compiler enforces its signatures. Out-of-process candidates declare their
//! signatures in a [`crate::signature::Manifest`] that is checked against
//! [`EXPECTED_SIGNATURES`].

use anyhow::Result;

use crate::model::{FitnessData, ProgressReport};

/// Name of the type a candidate must expose.
pub const TRACKER_TYPE: &str = "FitnessTracker";

pub const REGISTER_USER: &str = "register_user";
pub const LOG_WORKOUT: &str = "log_workout";
pub const CALCULATE_AVERAGE_CALORIES: &str = "calculate_average_calories";
pub const GENERATE_PROGRESS_REPORT: &str = "generate_progress_report";

/// Required operations and their parameter names, in declaration order,
/// excluding the receiver.
pub const EXPECTED_SIGNATURES: [(&str, &[&str]); 4] = [
    (REGISTER_USER, &["fitness_data", "user_name"]),
    (LOG_WORKOUT, &["fitness_data", "user_name", "calories_burned"]),
    (CALCULATE_AVERAGE_CALORIES, &["fitness_data", "user_name"]),
    (GENERATE_PROGRESS_REPORT, &["fitness_data"]),
];

/// Fitness tracking operations under test.
///
/// Mutating operations work on the caller's dataset in place and return a
/// snapshot of the updated dataset. Any error is a candidate fault.
pub trait FitnessTracker {
    /// Insert a zeroed, inactive record for `user_name`.
    fn register_user(&self, fitness_data: &mut FitnessData, user_name: &str)
    -> Result<FitnessData>;

    /// Add one workout and `calories_burned` to an existing user.
    ///
    /// Must fail when `user_name` is not in `fitness_data`.
    fn log_workout(
        &self,
        fitness_data: &mut FitnessData,
        user_name: &str,
        calories_burned: f64,
    ) -> Result<FitnessData>;

    /// Calories per workout for `user_name`.
    fn calculate_average_calories(&self, fitness_data: &FitnessData, user_name: &str)
    -> Result<f64>;

    /// Classify every user into a progress tier.
    fn generate_progress_report(&self, fitness_data: &FitnessData) -> Result<ProgressReport>;
}

/// Expected parameter names for `operation`, if it is part of the contract.
pub fn expected_params(operation: &str) -> Option<&'static [&'static str]> {
    EXPECTED_SIGNATURES
        .iter()
        .find(|(name, _)| *name == operation)
        .map(|(_, params)| *params)
}
