//! Error types for the SQL query collector.
//!
//! Every error is terminal for the polling cycle that produced it.

use std::num::ParseIntError;
use thiserror::Error;

/// Main error type for collector operations.
#[derive(Error, Debug)]
pub enum CollectorError {
    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, failed row fetches, timeouts, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// A row could not be turned into a metric.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Configuration errors (invalid config file, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CollectorError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Decode(_) => "Decode Error",
            Self::Config(_) => "Configuration Error",
        }
    }
}

/// What went wrong while decoding a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// A typed-numeric cell did not hold a base-10 signed 64-bit integer.
    NumericParse,
}

/// A cell could not be converted to its configured type.
///
/// Carries the offending column and its raw text so the failure can be
/// traced back to the source row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("column '{column}' holds {raw_text:?}, which is not a 64-bit integer: {source}")]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    pub column: String,
    pub raw_text: String,
    #[source]
    pub source: ParseIntError,
}

impl DecodeError {
    /// Creates a numeric parse error for the given column.
    pub fn numeric_parse(
        column: impl Into<String>,
        raw_text: impl Into<String>,
        source: ParseIntError,
    ) -> Self {
        Self {
            kind: DecodeErrorKind::NumericParse,
            column: column.into(),
            raw_text: raw_text.into(),
            source,
        }
    }
}

/// Result type alias using CollectorError.
pub type Result<T> = std::result::Result<T, CollectorError>;
