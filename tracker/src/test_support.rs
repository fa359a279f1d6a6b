//! Test-only in-process candidates with known behavior.

use anyhow::{Result, anyhow, bail};

use crate::contract::FitnessTracker;
use crate::model::{FitnessData, ProgressReport, Status, Tier, UserRecord};

/// A candidate that honors the whole contract.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConformingTracker;

impl FitnessTracker for ConformingTracker {
    fn register_user(
        &self,
        fitness_data: &mut FitnessData,
        user_name: &str,
    ) -> Result<FitnessData> {
        fitness_data.insert(user_name.to_string(), UserRecord::registered());
        Ok(fitness_data.clone())
    }

    fn log_workout(
        &self,
        fitness_data: &mut FitnessData,
        user_name: &str,
        calories_burned: f64,
    ) -> Result<FitnessData> {
        let record = fitness_data
            .get_mut(user_name)
            .ok_or_else(|| anyhow!("user {user_name} not found"))?;
        record.workouts += 1;
        record.calories += calories_burned;
        record.status = Status::Active;
        Ok(fitness_data.clone())
    }

    fn calculate_average_calories(
        &self,
        fitness_data: &FitnessData,
        user_name: &str,
    ) -> Result<f64> {
        let record = fitness_data
            .get(user_name)
            .ok_or_else(|| anyhow!("user {user_name} not found"))?;
        if record.workouts == 0 {
            bail!("user {user_name} has no workouts");
        }
        Ok(record.calories / f64::from(record.workouts))
    }

    fn generate_progress_report(&self, fitness_data: &FitnessData) -> Result<ProgressReport> {
        fitness_data
            .iter()
            .map(|(name, record)| {
                Tier::classify(record.calories)
                    .map(|tier| (name.clone(), tier))
                    .ok_or_else(|| anyhow!("calories {} sit on a tier boundary", record.calories))
            })
            .collect()
    }
}

/// A candidate that memorized one example instead of computing.
#[derive(Debug, Default, Clone, Copy)]
pub struct HardcodedTracker;

impl FitnessTracker for HardcodedTracker {
    fn register_user(
        &self,
        fitness_data: &mut FitnessData,
        _user_name: &str,
    ) -> Result<FitnessData> {
        fitness_data.insert("Alice".to_string(), UserRecord::registered());
        Ok(fitness_data.clone())
    }

    fn log_workout(
        &self,
        fitness_data: &mut FitnessData,
        user_name: &str,
        _calories_burned: f64,
    ) -> Result<FitnessData> {
        let record = fitness_data
            .get_mut(user_name)
            .ok_or_else(|| anyhow!("user {user_name} not found"))?;
        record.workouts = 1;
        record.calories = 300.0;
        Ok(fitness_data.clone())
    }

    fn calculate_average_calories(
        &self,
        _fitness_data: &FitnessData,
        _user_name: &str,
    ) -> Result<f64> {
        Ok(250.0)
    }

    fn generate_progress_report(&self, fitness_data: &FitnessData) -> Result<ProgressReport> {
        Ok(fitness_data
            .keys()
            .map(|name| (name.clone(), Tier::Beginner))
            .collect())
    }
}

/// A candidate that returns correct results without touching the caller's data,
/// and silently invents records for unknown users.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedTracker;

impl FitnessTracker for DetachedTracker {
    fn register_user(
        &self,
        fitness_data: &mut FitnessData,
        user_name: &str,
    ) -> Result<FitnessData> {
        let mut copy = fitness_data.clone();
        copy.insert(user_name.to_string(), UserRecord::registered());
        Ok(copy)
    }

    fn log_workout(
        &self,
        fitness_data: &mut FitnessData,
        user_name: &str,
        calories_burned: f64,
    ) -> Result<FitnessData> {
        let mut copy = fitness_data.clone();
        let record = copy
            .entry(user_name.to_string())
            .or_insert_with(UserRecord::registered);
        record.workouts += 1;
        record.calories += calories_burned;
        Ok(copy)
    }

    fn calculate_average_calories(
        &self,
        fitness_data: &FitnessData,
        user_name: &str,
    ) -> Result<f64> {
        ConformingTracker.calculate_average_calories(fitness_data, user_name)
    }

    fn generate_progress_report(&self, fitness_data: &FitnessData) -> Result<ProgressReport> {
        ConformingTracker.generate_progress_report(fitness_data)
    }
}

/// A candidate whose every operation faults.
#[derive(Debug, Default, Clone, Copy)]
pub struct FaultingTracker;

impl FitnessTracker for FaultingTracker {
    fn register_user(
        &self,
        _fitness_data: &mut FitnessData,
        _user_name: &str,
    ) -> Result<FitnessData> {
        bail!("register_user is not implemented")
    }

    fn log_workout(
        &self,
        _fitness_data: &mut FitnessData,
        _user_name: &str,
        _calories_burned: f64,
    ) -> Result<FitnessData> {
        bail!("log_workout is not implemented")
    }

    fn calculate_average_calories(
        &self,
        _fitness_data: &FitnessData,
        _user_name: &str,
    ) -> Result<f64> {
        bail!("division by zero")
    }

    fn generate_progress_report(&self, _fitness_data: &FitnessData) -> Result<ProgressReport> {
        bail!("generate_progress_report is not implemented")
    }
}

/// A dataset holding one record per `(name, workouts, calories)` entry.
pub fn dataset(entries: &[(&str, u32, f64)]) -> FitnessData {
    entries
        .iter()
        .map(|(name, workouts, calories)| {
            (
                name.to_string(),
                UserRecord::with_totals(*workouts, *calories, Status::Inactive),
            )
        })
        .collect()
}
