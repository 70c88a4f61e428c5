//! Destinations for decoded metric records.
//!
//! Sinks are infallible from the runner's point of view: a sink that cannot
//! deliver a record logs the problem and moves on.

mod json;
mod line_protocol;

pub use json::JsonSink;
pub use line_protocol::LineProtocolSink;

use crate::metrics::MetricRecord;
use std::time::{SystemTime, UNIX_EPOCH};

/// Receives one record per decoded row.
pub trait MetricSink: Send {
    /// Accepts a record emitted under `measurement`.
    fn accept(&mut self, measurement: &str, record: MetricRecord);
}

/// A sink that keeps every record in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    records: Vec<(String, MetricRecord)>,
}

impl CollectingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records received so far, in arrival order.
    pub fn records(&self) -> &[(String, MetricRecord)] {
        &self.records
    }

    /// Consumes the sink, returning its records.
    pub fn into_records(self) -> Vec<(String, MetricRecord)> {
        self.records
    }
}

impl MetricSink for CollectingSink {
    fn accept(&mut self, measurement: &str, record: MetricRecord) {
        self.records.push((measurement.to_string(), record));
    }
}

/// Current time as nanoseconds since the Unix epoch.
pub(crate) fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
