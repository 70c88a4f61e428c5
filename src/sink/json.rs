//! JSON lines output.

use super::{now_nanos, MetricSink};
use crate::metrics::{FieldValue, MetricRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use tracing::warn;

#[derive(Serialize)]
struct JsonMetric<'a> {
    name: &'a str,
    tags: &'a BTreeMap<String, String>,
    fields: &'a BTreeMap<String, FieldValue>,
    timestamp: u64,
}

/// Writes one JSON object per record, newline-delimited.
pub struct JsonSink<W> {
    writer: W,
    clock: fn() -> u64,
}

impl<W: Write + Send> JsonSink<W> {
    /// Creates a sink writing to `writer`, stamping records with the wall clock.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            clock: now_nanos,
        }
    }

    /// Replaces the timestamp source.
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    /// Consumes the sink, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_record(&mut self, metric: &JsonMetric<'_>) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, metric)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

impl<W: Write + Send> MetricSink for JsonSink<W> {
    fn accept(&mut self, measurement: &str, record: MetricRecord) {
        let metric = JsonMetric {
            name: measurement,
            tags: &record.tags,
            fields: &record.fields,
            timestamp: (self.clock)(),
        };

        if let Err(e) = self.write_record(&metric) {
            warn!("Failed to write '{}' record: {}", measurement, e);
        }
    }
}
