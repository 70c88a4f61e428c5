//! Metric record types.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Value of a column listed in `int_fields`.
    Integer(i64),

    /// Value of any other non-tag column, kept as the driver's text.
    String(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

/// One decoded result row.
///
/// Columns whose cell was NULL have no entry in either map. A record may
/// therefore carry no fields at all; it is still emitted and the sink
/// decides what to do with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricRecord {
    /// Tag name to tag value.
    pub tags: BTreeMap<String, String>,

    /// Field name to typed value.
    pub fields: BTreeMap<String, FieldValue>,
}

impl MetricRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag, replacing any previous value under the same name.
    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(name.into(), value.into());
        self
    }

    /// Adds a field, replacing any previous value under the same name.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Returns true if the record carries no fields.
    pub fn has_no_fields(&self) -> bool {
        self.fields.is_empty()
    }
}
