//! The five graded test cases.
//!
//! Each case runs in isolation: signature mismatches, candidate errors and
//! candidate panics all become a failed [`CaseOutcome`] for that case alone, so
//! every case yields exactly one outcome.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use anyhow::Result;
use tracing::{debug, instrument};
use tracker::contract::{
    CALCULATE_AVERAGE_CALORIES, FitnessTracker, GENERATE_PROGRESS_REPORT, LOG_WORKOUT,
    REGISTER_USER,
};
use tracker::model::{
    FitnessData, ProgressReport, Status, Tier, UserRecord, render_dataset, render_report,
};
use tracker::signature::SignatureFailures;

use crate::fixtures::{AVERAGE_TOLERANCE, AverageInput, Fixtures};
use crate::outcome::{CaseId, CaseOutcome};

/// Calories logged against the user that does not exist.
const UNKNOWN_USER_CALORIES: f64 = 200.0;

/// Everything a case needs; shared read-only across cases.
pub struct CaseContext<'a> {
    pub tracker: &'a dyn FitnessTracker,
    pub signature_failures: &'a SignatureFailures,
    pub fixtures: &'a Fixtures,
}

/// Operation whose signature gates the case.
pub fn operation_under_test(id: CaseId) -> &'static str {
    match id {
        CaseId::RegisterUser => REGISTER_USER,
        CaseId::LogWorkout | CaseId::UnknownUser => LOG_WORKOUT,
        CaseId::AverageCalories => CALCULATE_AVERAGE_CALORIES,
        CaseId::ProgressReport => GENERATE_PROGRESS_REPORT,
    }
}

/// Run every case in report order.
pub fn run_all(ctx: &CaseContext<'_>) -> Vec<CaseOutcome> {
    CaseId::ALL.iter().map(|id| run_case(*id, ctx)).collect()
}

/// Run one case, converting every fault into a failed outcome.
#[instrument(skip(ctx), fields(case = id.code()))]
pub fn run_case(id: CaseId, ctx: &CaseContext<'_>) -> CaseOutcome {
    let operation = operation_under_test(id);
    if let Some(mismatch) = ctx.signature_failures.for_operation(operation) {
        debug!(operation, "skipping case on signature mismatch");
        return CaseOutcome::fail(id, format!("Signature mismatch for {operation}: {mismatch}"));
    }

    let body: fn(&CaseContext<'_>) -> Result<CaseOutcome> = match id {
        CaseId::RegisterUser => register_user,
        CaseId::LogWorkout => log_workout,
        CaseId::AverageCalories => average_calories,
        CaseId::ProgressReport => progress_report,
        CaseId::UnknownUser => unknown_user,
    };

    let outcome = match catch_unwind(AssertUnwindSafe(|| body(ctx))) {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(err)) => CaseOutcome::fail(id, format!("{err:#}")),
        // A panic is a raised fault like any other.
        Err(_) if id == CaseId::UnknownUser => CaseOutcome::pass(id),
        Err(payload) => CaseOutcome::fail(id, panic_message(payload.as_ref())),
    };
    debug!(passed = outcome.passed, "case finished");
    outcome
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("candidate panicked: {detail}")
}

fn register_user(ctx: &CaseContext<'_>) -> Result<CaseOutcome> {
    let id = CaseId::RegisterUser;
    let user = &ctx.fixtures.user_a;
    let expected = UserRecord::registered();

    let mut data = FitnessData::new();
    let returned = ctx.tracker.register_user(&mut data, user)?;
    if returned.get(user) != Some(&expected) {
        let wanted = FitnessData::from([(user.clone(), expected)]);
        return Ok(CaseOutcome::fail(
            id,
            format!(
                "Incorrect structure. Expected {} but got {}",
                render_dataset(&wanted),
                render_dataset(&returned)
            ),
        ));
    }
    if data.get(user) != Some(&expected) {
        return Ok(CaseOutcome::fail(
            id,
            "Function doesn't modify the input dictionary correctly",
        ));
    }

    let other = &ctx.fixtures.user_b;
    let mut data = FitnessData::new();
    let returned = ctx.tracker.register_user(&mut data, other)?;
    if returned.get(other) != Some(&expected) || data.get(other) != Some(&expected) {
        return Ok(CaseOutcome::fail(
            id,
            "Doesn't handle different usernames correctly",
        ));
    }
    Ok(CaseOutcome::pass(id))
}

fn log_workout(ctx: &CaseContext<'_>) -> Result<CaseOutcome> {
    let id = CaseId::LogWorkout;
    let fixtures = ctx.fixtures;

    let user = &fixtures.user_a;
    let calories = f64::from(fixtures.calories_a);
    let mut data = FitnessData::from([(user.clone(), UserRecord::registered())]);
    let returned = ctx.tracker.log_workout(&mut data, user, calories)?;
    if !logged_once(returned.get(user), calories) {
        let got = returned
            .get(user)
            .map_or_else(|| "{}".to_string(), ToString::to_string);
        return Ok(CaseOutcome::fail(
            id,
            format!("Incorrect update. Expected workouts=1, calories={calories} but got {got}"),
        ));
    }
    if !logged_once(data.get(user), calories) {
        return Ok(CaseOutcome::fail(
            id,
            "Function doesn't modify the input dictionary correctly",
        ));
    }

    let other = &fixtures.user_b;
    let calories = f64::from(fixtures.calories_b);
    let mut data = FitnessData::from([(other.clone(), UserRecord::registered())]);
    let returned = ctx.tracker.log_workout(&mut data, other, calories)?;
    if !logged_once(returned.get(other), calories) || !logged_once(data.get(other), calories) {
        return Ok(CaseOutcome::fail(
            id,
            "Doesn't handle different calorie values correctly",
        ));
    }
    Ok(CaseOutcome::pass(id))
}

/// One workout carrying exactly `calories`; status may have changed.
fn logged_once(record: Option<&UserRecord>, calories: f64) -> bool {
    record.is_some_and(|record| record.workouts == 1 && record.calories == calories)
}

fn average_calories(ctx: &CaseContext<'_>) -> Result<CaseOutcome> {
    let id = CaseId::AverageCalories;
    let fixtures = ctx.fixtures;

    let (expected, actual) = measure_average(ctx, &fixtures.user_c, fixtures.average_first)?;
    if !within_tolerance(actual, expected) {
        return Ok(CaseOutcome::fail(
            id,
            format!("Incorrect average. Expected {expected} but got {actual}"),
        ));
    }

    let (expected, actual) = measure_average(ctx, &fixtures.user_b, fixtures.average_second)?;
    if !within_tolerance(actual, expected) {
        return Ok(CaseOutcome::fail(
            id,
            "Doesn't calculate different values correctly",
        ));
    }
    Ok(CaseOutcome::pass(id))
}

fn measure_average(
    ctx: &CaseContext<'_>,
    user: &str,
    input: AverageInput,
) -> Result<(f64, f64)> {
    let calories = f64::from(input.calories);
    let record = UserRecord::with_totals(input.workouts, calories, Status::Inactive);
    let data = FitnessData::from([(user.to_string(), record)]);
    let actual = ctx.tracker.calculate_average_calories(&data, user)?;
    Ok((input.expected(), actual))
}

fn within_tolerance(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < AVERAGE_TOLERANCE
}

fn progress_report(ctx: &CaseContext<'_>) -> Result<CaseOutcome> {
    let id = CaseId::ProgressReport;
    let fixtures = ctx.fixtures;
    let users = [
        (&fixtures.user_a, 3, 800.0, Status::Inactive, Tier::Beginner),
        (&fixtures.user_b, 5, 3000.0, Status::Active, Tier::Intermediate),
        (&fixtures.user_c, 10, 6000.0, Status::Active, Tier::Advanced),
    ];

    let data: FitnessData = users
        .iter()
        .map(|(name, workouts, calories, status, _)| {
            (
                name.to_string(),
                UserRecord::with_totals(*workouts, *calories, *status),
            )
        })
        .collect();
    let expected: ProgressReport = users
        .iter()
        .map(|(name, _, _, _, tier)| (name.to_string(), *tier))
        .collect();

    let report = ctx.tracker.generate_progress_report(&data)?;
    let matches = expected
        .iter()
        .all(|(name, tier)| report.get(name) == Some(tier));
    if !matches {
        return Ok(CaseOutcome::fail(
            id,
            format!(
                "Incorrect classification. Expected {} but got {}",
                render_report(&expected),
                render_report(&report)
            ),
        ));
    }
    Ok(CaseOutcome::pass(id))
}

fn unknown_user(ctx: &CaseContext<'_>) -> Result<CaseOutcome> {
    let id = CaseId::UnknownUser;
    let mut data = FitnessData::new();
    let result = ctx.tracker.log_workout(
        &mut data,
        &ctx.fixtures.nonexistent_user,
        UNKNOWN_USER_CALORIES,
    );
    Ok(match result {
        Ok(_) => CaseOutcome::fail(id, "Expected exception for non-existent user"),
        Err(err) => {
            debug!(err = %format!("{err:#}"), "candidate rejected unknown user");
            CaseOutcome::pass(id)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker::signature::{Manifest, verify_manifest};
    use tracker::test_support::{
        ConformingTracker, DetachedTracker, FaultingTracker, HardcodedTracker,
    };

    fn fixtures() -> Fixtures {
        Fixtures {
            user_a: "Qwerty".to_string(),
            user_b: "Zxcvbn".to_string(),
            user_c: "Poiuyt".to_string(),
            calories_a: 120,
            calories_b: 470,
            average_first: AverageInput {
                workouts: 3,
                calories: 700,
            },
            average_second: AverageInput {
                workouts: 4,
                calories: 950,
            },
            nonexistent_user: "NonExistentUser_abcde".to_string(),
        }
    }

    fn grade(tracker: &dyn FitnessTracker, failures: &SignatureFailures) -> Vec<CaseOutcome> {
        let fixtures = fixtures();
        let ctx = CaseContext {
            tracker,
            signature_failures: failures,
            fixtures: &fixtures,
        };
        run_all(&ctx)
    }

    fn outcome(outcomes: &[CaseOutcome], id: CaseId) -> &CaseOutcome {
        outcomes
            .iter()
            .find(|outcome| outcome.id == id)
            .expect("outcome present")
    }

    fn reason(outcomes: &[CaseOutcome], id: CaseId) -> String {
        outcome(outcomes, id).reason.clone().unwrap_or_default()
    }

    struct PanickingTracker;

    impl FitnessTracker for PanickingTracker {
        fn register_user(&self, _: &mut FitnessData, _: &str) -> Result<FitnessData> {
            panic!("index out of range")
        }

        fn log_workout(&self, _: &mut FitnessData, user_name: &str, _: f64) -> Result<FitnessData> {
            panic!("no entry for {user_name}")
        }

        fn calculate_average_calories(&self, _: &FitnessData, _: &str) -> Result<f64> {
            Ok(f64::NAN)
        }

        fn generate_progress_report(&self, _: &FitnessData) -> Result<ProgressReport> {
            Ok(ProgressReport::new())
        }
    }

    /// Answers the first fixture of each case correctly and nothing else.
    struct MemorizedTracker;

    impl FitnessTracker for MemorizedTracker {
        fn register_user(&self, data: &mut FitnessData, _: &str) -> Result<FitnessData> {
            ConformingTracker.register_user(data, "Qwerty")
        }

        fn log_workout(
            &self,
            data: &mut FitnessData,
            user_name: &str,
            _: f64,
        ) -> Result<FitnessData> {
            ConformingTracker.log_workout(data, user_name, 120.0)
        }

        fn calculate_average_calories(&self, _: &FitnessData, _: &str) -> Result<f64> {
            Ok(700.0 / 3.0)
        }

        fn generate_progress_report(&self, data: &FitnessData) -> Result<ProgressReport> {
            ConformingTracker.generate_progress_report(data)
        }
    }

    #[test]
    fn conforming_candidate_passes_every_case() {
        let outcomes = grade(&ConformingTracker, &SignatureFailures::none());
        assert_eq!(outcomes.len(), 5);
        for outcome in &outcomes {
            assert!(outcome.passed, "{}", outcome.line());
        }
        let ids = outcomes.iter().map(|outcome| outcome.id).collect::<Vec<_>>();
        assert_eq!(ids, CaseId::ALL);
    }

    #[test]
    fn hardcoded_candidate_is_caught() {
        let outcomes = grade(&HardcodedTracker, &SignatureFailures::none());
        assert!(reason(&outcomes, CaseId::RegisterUser).starts_with(
            "Incorrect structure. Expected {'Qwerty': {'workouts': 0, 'calories': 0, 'status': 'Inactive'}} but got {'Alice'"
        ));
        assert_eq!(
            reason(&outcomes, CaseId::LogWorkout),
            "Incorrect update. Expected workouts=1, calories=120 but got \
             {'workouts': 1, 'calories': 300, 'status': 'Inactive'}"
        );
        assert_eq!(
            reason(&outcomes, CaseId::AverageCalories),
            format!(
                "Incorrect average. Expected {} but got 250",
                700.0_f64 / 3.0
            )
        );
        assert!(reason(&outcomes, CaseId::ProgressReport).starts_with("Incorrect classification."));
        assert!(outcome(&outcomes, CaseId::UnknownUser).passed);
    }

    #[test]
    fn memorized_first_answers_fail_the_second_call() {
        let outcomes = grade(&MemorizedTracker, &SignatureFailures::none());
        assert_eq!(
            reason(&outcomes, CaseId::RegisterUser),
            "Doesn't handle different usernames correctly"
        );
        assert_eq!(
            reason(&outcomes, CaseId::LogWorkout),
            "Doesn't handle different calorie values correctly"
        );
        assert_eq!(
            reason(&outcomes, CaseId::AverageCalories),
            "Doesn't calculate different values correctly"
        );
        assert!(outcome(&outcomes, CaseId::ProgressReport).passed);
        assert!(outcome(&outcomes, CaseId::UnknownUser).passed);
    }

    #[test]
    fn detached_candidate_fails_mutation_and_unknown_user() {
        let outcomes = grade(&DetachedTracker, &SignatureFailures::none());
        assert_eq!(
            reason(&outcomes, CaseId::RegisterUser),
            "Function doesn't modify the input dictionary correctly"
        );
        assert_eq!(
            reason(&outcomes, CaseId::LogWorkout),
            "Function doesn't modify the input dictionary correctly"
        );
        assert!(outcome(&outcomes, CaseId::AverageCalories).passed);
        assert!(outcome(&outcomes, CaseId::ProgressReport).passed);
        assert_eq!(
            reason(&outcomes, CaseId::UnknownUser),
            "Expected exception for non-existent user"
        );
    }

    #[test]
    fn candidate_errors_become_reasons() {
        let outcomes = grade(&FaultingTracker, &SignatureFailures::none());
        assert_eq!(outcomes.len(), 5);
        assert_eq!(
            reason(&outcomes, CaseId::RegisterUser),
            "register_user is not implemented"
        );
        assert_eq!(reason(&outcomes, CaseId::AverageCalories), "division by zero");
        assert!(outcome(&outcomes, CaseId::UnknownUser).passed);
    }

    #[test]
    fn panics_are_contained_per_case() {
        let outcomes = grade(&PanickingTracker, &SignatureFailures::none());
        assert_eq!(outcomes.len(), 5);
        assert_eq!(
            reason(&outcomes, CaseId::RegisterUser),
            "candidate panicked: index out of range"
        );
        assert_eq!(
            reason(&outcomes, CaseId::LogWorkout),
            "candidate panicked: no entry for Qwerty"
        );
        assert!(reason(&outcomes, CaseId::AverageCalories).ends_with("but got NaN"));
        assert_eq!(
            reason(&outcomes, CaseId::ProgressReport),
            "Incorrect classification. Expected {'Poiuyt': 'Advanced', 'Qwerty': 'Beginner', \
             'Zxcvbn': 'Intermediate'} but got {}"
        );
        assert!(outcome(&outcomes, CaseId::UnknownUser).passed);
    }

    #[test]
    fn signature_mismatch_fails_only_affected_cases() {
        let mut manifest = Manifest::expected();
        manifest.operations.insert(
            LOG_WORKOUT.to_string(),
            vec!["data".to_string(), "user".to_string(), "calories".to_string()],
        );
        let failures = verify_manifest(&manifest);
        let outcomes = grade(&ConformingTracker, &failures);

        let expected = "Signature mismatch for log_workout: log_workout (expected \
                        ['fitness_data', 'user_name', 'calories_burned'], got \
                        ['data', 'user', 'calories'])";
        assert_eq!(reason(&outcomes, CaseId::LogWorkout), expected);
        assert_eq!(reason(&outcomes, CaseId::UnknownUser), expected);
        assert!(outcome(&outcomes, CaseId::RegisterUser).passed);
        assert!(outcome(&outcomes, CaseId::AverageCalories).passed);
        assert!(outcome(&outcomes, CaseId::ProgressReport).passed);
    }
}
