//! Stable exit codes for grader CLI commands.

/// Every case passed, or the command had nothing to grade.
pub const OK: i32 = 0;
/// The grader could not run: bad config, unwritable report, or other errors.
pub const INVALID: i32 = 1;
/// Grading finished and at least one case failed.
pub const FAILED: i32 = 2;
