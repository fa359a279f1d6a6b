//! Per-case results and their report lines.

use std::fmt;

use serde::Serialize;

/// The graded test cases, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CaseId {
    #[serde(rename = "TC1")]
    RegisterUser,
    #[serde(rename = "TC2")]
    LogWorkout,
    #[serde(rename = "TC3")]
    AverageCalories,
    #[serde(rename = "HTC1")]
    ProgressReport,
    #[serde(rename = "HTC2")]
    UnknownUser,
}

impl CaseId {
    pub const ALL: [CaseId; 5] = [
        CaseId::RegisterUser,
        CaseId::LogWorkout,
        CaseId::AverageCalories,
        CaseId::ProgressReport,
        CaseId::UnknownUser,
    ];

    pub fn code(self) -> &'static str {
        match self {
            CaseId::RegisterUser => "TC1",
            CaseId::LogWorkout => "TC2",
            CaseId::AverageCalories => "TC3",
            CaseId::ProgressReport => "HTC1",
            CaseId::UnknownUser => "HTC2",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            CaseId::RegisterUser => "Registering a New Fitness User",
            CaseId::LogWorkout => "Logging a Workout Session",
            CaseId::AverageCalories => "Calculating Average Calories Burned",
            CaseId::ProgressReport => "Generating Progress Reports",
            CaseId::UnknownUser => "Handling Workout Logging for Non-Existent Users",
        }
    }
}

/// Outcome of one test case; renders as one report line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseOutcome {
    pub id: CaseId,
    pub title: &'static str,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CaseOutcome {
    pub fn pass(id: CaseId) -> Self {
        Self {
            id,
            title: id.title(),
            passed: true,
            reason: None,
        }
    }

    pub fn fail(id: CaseId, reason: impl Into<String>) -> Self {
        Self {
            id,
            title: id.title(),
            passed: false,
            reason: Some(reason.into()),
        }
    }

    pub fn line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.reason, self.passed) {
            (_, true) => write!(f, "✅ {}: {}", self.id.code(), self.title),
            (Some(reason), false) => write!(
                f,
                "❌ {}: {} failed | Reason: {}",
                self.id.code(),
                self.title,
                reason
            ),
            (None, false) => write!(f, "❌ {}: {} failed", self.id.code(), self.title),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_pass_line() {
        let outcome = CaseOutcome::pass(CaseId::LogWorkout);
        assert_eq!(outcome.line(), "✅ TC2: Logging a Workout Session");
    }

    #[test]
    fn renders_fail_line_with_reason() {
        let outcome = CaseOutcome::fail(CaseId::ProgressReport, "boom");
        assert_eq!(
            outcome.line(),
            "❌ HTC1: Generating Progress Reports failed | Reason: boom"
        );
    }

    #[test]
    fn serializes_case_code() {
        let outcome = CaseOutcome::fail(CaseId::UnknownUser, "no fault");
        let json = serde_json::to_value(&outcome).expect("json");
        assert_eq!(json["id"], "HTC2");
        assert_eq!(json["passed"], false);
        assert_eq!(json["reason"], "no fault");
    }
}
