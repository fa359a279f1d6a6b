//! Randomized test inputs.
//!
//! Values are drawn fresh on every run so a candidate cannot pass by
//! memorizing outputs. Cases must check results structurally or numerically,
//! never against literals.

use std::ops::RangeInclusive;

use rand::Rng;

/// Names a naive candidate is likely to hardcode.
const OBVIOUS_NAMES: [&str; 2] = ["Alice", "Bob"];

/// Calories burned per logged workout.
pub const LOGGED_CALORIES: RangeInclusive<u32> = 100..=500;
/// Workout counts for averaging.
pub const WORKOUT_COUNTS: RangeInclusive<u32> = 2..=5;
/// Calorie totals for averaging.
pub const CALORIE_TOTALS: RangeInclusive<u32> = 500..=1000;

/// Absolute tolerance when comparing averages.
pub const AVERAGE_TOLERANCE: f64 = 0.01;

/// Prefix of the user name that is never registered.
pub const NONEXISTENT_PREFIX: &str = "NonExistentUser_";

/// A workout count and calorie total for one averaging check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AverageInput {
    pub workouts: u32,
    pub calories: u32,
}

impl AverageInput {
    pub fn expected(self) -> f64 {
        f64::from(self.calories) / f64::from(self.workouts)
    }
}

/// Every random value one grading run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixtures {
    pub user_a: String,
    pub user_b: String,
    pub user_c: String,
    pub calories_a: u32,
    pub calories_b: u32,
    pub average_first: AverageInput,
    pub average_second: AverageInput,
    pub nonexistent_user: String,
}

impl Fixtures {
    /// Draw a fresh set from the thread-local generator.
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    /// Draw a fresh set from `rng`.
    ///
    /// Paired values always differ so a single memorized answer cannot pass
    /// both halves of a case.
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let user_a = random_user_name(rng);
        let user_b = resample(rng, random_user_name, |name| *name != user_a);
        let user_c = resample(rng, random_user_name, |name| {
            *name != user_a && *name != user_b
        });
        let calories_a = rng.gen_range(LOGGED_CALORIES);
        let calories_b = resample(
            rng,
            |rng| rng.gen_range(LOGGED_CALORIES),
            |calories| *calories != calories_a,
        );
        let average_first = random_average_input(rng);
        let average_second = resample(rng, random_average_input, |input| {
            (input.expected() - average_first.expected()).abs() >= AVERAGE_TOLERANCE
        });
        Self {
            user_a,
            user_b,
            user_c,
            calories_a,
            calories_b,
            average_first,
            average_second,
            nonexistent_user: nonexistent_user_name(rng),
        }
    }
}

/// One uppercase letter then five lowercase letters, never an obvious name.
pub fn random_user_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    loop {
        let mut name = String::with_capacity(6);
        name.push(char::from(rng.gen_range(b'A'..=b'Z')));
        name.extend(random_lowercase(rng, 5));
        if !OBVIOUS_NAMES.contains(&name.as_str()) {
            return name;
        }
    }
}

pub fn nonexistent_user_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut name = NONEXISTENT_PREFIX.to_string();
    name.extend(random_lowercase(rng, 5));
    name
}

fn resample<R, T>(rng: &mut R, draw: impl Fn(&mut R) -> T, accept: impl Fn(&T) -> bool) -> T
where
    R: Rng + ?Sized,
{
    loop {
        let value = draw(rng);
        if accept(&value) {
            return value;
        }
    }
}

fn random_average_input<R: Rng + ?Sized>(rng: &mut R) -> AverageInput {
    AverageInput {
        workouts: rng.gen_range(WORKOUT_COUNTS),
        calories: rng.gen_range(CALORIE_TOTALS),
    }
}

fn random_lowercase<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Vec<char> {
    (0..len)
        .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
        .collect()
}
