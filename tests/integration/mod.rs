//! Integration tests for the SQL query collector.

pub mod config_test;
pub mod runner_test;
