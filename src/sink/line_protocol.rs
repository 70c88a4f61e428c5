//! Line protocol output.
//!
//! Each record becomes one line:
//! `measurement[,tag=value...] field=value[,field=value...] timestamp`.

use super::{now_nanos, MetricSink};
use crate::metrics::{FieldValue, MetricRecord};
use std::io::Write;
use tracing::{debug, warn};

/// Writes records as line protocol.
pub struct LineProtocolSink<W> {
    writer: W,
    line: String,
    clock: fn() -> u64,
}

impl<W: Write + Send> LineProtocolSink<W> {
    /// Creates a sink writing to `writer`, stamping records with the wall clock.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            line: String::new(),
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
}

impl<W: Write + Send> MetricSink for LineProtocolSink<W> {
    fn accept(&mut self, measurement: &str, record: MetricRecord) {
        // Line protocol requires at least one field.
        if record.has_no_fields() {
            debug!("Skipping '{}' record without fields", measurement);
            return;
        }

        self.line.clear();
        format_line(&mut self.line, measurement, &record, (self.clock)());

        let written = self
            .writer
            .write_all(self.line.as_bytes())
            .and_then(|()| self.writer.flush());
        if let Err(e) = written {
            warn!("Failed to write '{}' record: {}", measurement, e);
        }
    }
}

fn format_line(out: &mut String, measurement: &str, record: &MetricRecord, timestamp: u64) {
    push_escaped(out, measurement, &[',', ' ']);

    // Line protocol has no representation for an empty tag value.
    for (key, value) in record.tags.iter().filter(|(_, value)| !value.is_empty()) {
        out.push(',');
        push_escaped(out, key, &[',', '=', ' ']);
        out.push('=');
        push_escaped(out, value, &[',', '=', ' ']);
    }

    for (i, (key, value)) in record.fields.iter().enumerate() {
        out.push(if i == 0 { ' ' } else { ',' });
        push_escaped(out, key, &[',', '=', ' ']);
        out.push('=');
        match value {
            FieldValue::Integer(n) => {
                out.push_str(&n.to_string());
                out.push('i');
            }
            FieldValue::String(s) => {
                out.push('"');
                push_escaped(out, s, &['"', '\\']);
                out.push('"');
            }
        }
    }

    out.push(' ');
    out.push_str(&timestamp.to_string());
    out.push('\n');
}

/// Newlines are always escaped so a record stays on one line.
fn push_escaped(out: &mut String, text: &str, special: &[char]) {
    for c in text.chars() {
        if c == '\n' {
            out.push_str("\\n");
            continue;
        }
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}
