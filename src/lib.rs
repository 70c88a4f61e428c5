//! sqlquery - turns SQL query results into metrics.
//!
//! Every configured query is run once per polling cycle. Each result row
//! becomes one metric record whose tag columns become tags and whose other
//! columns become integer or string fields.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod query;
pub mod sink;
