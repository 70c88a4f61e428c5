//! Query execution for polling cycles.
//!
//! This module drives the configured queries against an executor and
//! streams the decoded rows to a metric sink.

mod runner;

pub use runner::{run, QueryRunner, RunConfig, RunSummary};
