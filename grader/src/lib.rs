//! Grading harness for fitness tracker candidates.
//!
//! A candidate is either an executable speaking the `tracker::protocol` wire
//! format ([`run::grade_path`]) or a compiled-in [`tracker::contract::FitnessTracker`]
//! ([`run::grade_tracker`]). Either way the harness runs five isolated cases on
//! fresh random fixtures and writes one report line per case.

pub mod candidate;
pub mod cases;
pub mod cli;
pub mod config;
pub mod exit_codes;
pub mod fixtures;
pub mod logging;
pub mod outcome;
pub mod process;
pub mod report;
pub mod run;
