//! CLI library components for the schema grader.

pub mod config;
pub mod grading;
pub mod logging;
pub mod report;
pub mod snapshot;
pub mod types;
