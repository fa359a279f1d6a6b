//! Fitness dataset types passed through every tracker operation.
//!
//! These types are the shared vocabulary between the grader and candidates.
//! They serialize to the JSON shapes used on the candidate wire protocol.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, de};

/// Mapping from user name to that user's record.
pub type FitnessData = BTreeMap<String, UserRecord>;

/// Mapping from user name to progress tier.
pub type ProgressReport = BTreeMap<String, Tier>;

/// Calories below this total classify as [`Tier::Beginner`].
pub const BEGINNER_CEILING: f64 = 1000.0;

/// Calories above this total classify as [`Tier::Advanced`].
pub const ADVANCED_FLOOR: f64 = 5000.0;

/// Activity status of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Active,
    Inactive,
}

/// Per-user workout totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Number of workouts logged.
    #[serde(deserialize_with = "whole_count")]
    pub workouts: u32,
    /// Cumulative calories burned.
    pub calories: f64,
    pub status: Status,
}

impl UserRecord {
    /// A freshly registered user: no workouts, no calories, inactive.
    pub fn registered() -> Self {
        Self {
            workouts: 0,
            calories: 0.0,
            status: Status::Inactive,
        }
    }

    pub fn with_totals(workouts: u32, calories: f64, status: Status) -> Self {
        Self {
            workouts,
            calories,
            status,
        }
    }
}

/// Accept `1` and `1.0` alike; dynamically typed candidates emit either.
fn whole_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let count = f64::deserialize(deserializer)?;
    if count.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&count) {
        Ok(count as u32)
    } else {
        Err(de::Error::custom(format!(
            "workout count {count} is not a whole number"
        )))
    }
}

impl fmt::Display for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{'workouts': {}, 'calories': {}, 'status': '{:?}'}}",
            self.workouts, self.calories, self.status
        )
    }
}

/// Progress classification derived from cumulative calories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Beginner,
    Intermediate,
    Advanced,
}

impl Tier {
    /// Classify a calorie total.
    ///
    /// Returns `None` for totals of exactly 1000 or 5000: which tier owns the
    /// boundary is unresolved and awaits product clarification.
    pub fn classify(calories: f64) -> Option<Tier> {
        if calories < BEGINNER_CEILING {
            Some(Tier::Beginner)
        } else if calories > BEGINNER_CEILING && calories < ADVANCED_FLOOR {
            Some(Tier::Intermediate)
        } else if calories > ADVANCED_FLOOR {
            Some(Tier::Advanced)
        } else {
            None
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::Beginner => "Beginner",
            Tier::Intermediate => "Intermediate",
            Tier::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Render a dataset in the `{'name': {...}}` style used by report reasons.
pub fn render_dataset(data: &FitnessData) -> String {
    let entries = data
        .iter()
        .map(|(name, record)| format!("'{name}': {record}"))
        .collect::<Vec<_>>();
    format!("{{{}}}", entries.join(", "))
}

/// Render a progress report in the `{'name': 'Tier'}` style used by report reasons.
pub fn render_report(report: &ProgressReport) -> String {
    let entries = report
        .iter()
        .map(|(name, tier)| format!("'{name}': '{tier}'"))
        .collect::<Vec<_>>();
    format!("{{{}}}", entries.join(", "))
}
