//! Sequential execution of the configured queries.
//!
//! Each query is classified once, its rows are decoded one at a time into
//! a reused buffer, and every record goes to the sink as soon as it exists.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::db::{QueryExecutor, ResultCursor, RowBuffer};
use crate::error::{CollectorError, Result};
use crate::metrics::{classify, decode, ColumnRole};
use crate::sink::MetricSink;

/// Immutable settings for one polling cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// Measurement name attached to every record of the run.
    pub measurement: String,

    /// Queries performed in order.
    pub queries: Vec<String>,

    /// Columns whose cells become tags.
    pub tag_columns: HashSet<String>,

    /// Columns whose cells are parsed as 64-bit integers.
    pub int_columns: HashSet<String>,
}

impl RunConfig {
    /// Creates settings with no tag or integer columns.
    pub fn new(measurement: impl Into<String>, queries: Vec<String>) -> Self {
        Self {
            measurement: measurement.into(),
            queries,
            tag_columns: HashSet::new(),
            int_columns: HashSet::new(),
        }
    }

    /// Adds tag columns.
    pub fn with_tag_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tag_columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Adds integer columns.
    pub fn with_int_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.int_columns.extend(columns.into_iter().map(Into::into));
        self
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Queries performed.
    pub queries: usize,

    /// Records handed to the sink.
    pub records: usize,

    /// Wall time of the whole run.
    pub elapsed: Duration,
}

/// Runs every configured query once and streams the records to a sink.
pub struct QueryRunner<'a> {
    executor: &'a dyn QueryExecutor,
    config: &'a RunConfig,
}

impl<'a> QueryRunner<'a> {
    /// Creates a runner over the given executor and settings.
    pub fn new(executor: &'a dyn QueryExecutor, config: &'a RunConfig) -> Self {
        Self { executor, config }
    }

    /// Performs one polling cycle.
    ///
    /// Queries run in order. The first failure ends the run; records already
    /// delivered stay delivered.
    pub async fn run(&self, sink: &mut dyn MetricSink) -> Result<RunSummary> {
        let start = Instant::now();
        let mut summary = RunSummary::default();

        for sql in &self.config.queries {
            summary.records += self.run_query(sql, sink).await?;
            summary.queries += 1;
        }

        summary.elapsed = start.elapsed();
        Ok(summary)
    }

    async fn run_query(&self, sql: &str, sink: &mut dyn MetricSink) -> Result<usize> {
        info!("Performing query '{}'", sql);

        let mut cursor = self.executor.execute(sql).await?;
        let outcome = self.drain(sql, cursor.as_mut(), sink).await;
        cursor.close();
        outcome
    }

    async fn drain(
        &self,
        sql: &str,
        cursor: &mut dyn ResultCursor,
        sink: &mut dyn MetricSink,
    ) -> Result<usize> {
        let columns = cursor.column_names()?;
        let classification = classify(
            &columns,
            &self.config.tag_columns,
            &self.config.int_columns,
        );
        debug!(
            "Query '{}' received {} tags and {} (int) + {} (str) fields",
            sql,
            classification.count(ColumnRole::Tag),
            classification.count(ColumnRole::TypedNumeric),
            classification.count(ColumnRole::DefaultText)
        );

        let mut row = RowBuffer::with_width(columns.len());
        let mut emitted = 0;

        while cursor.next_row(&mut row).await? {
            if row.len() != columns.len() {
                return Err(CollectorError::query(format!(
                    "Query '{sql}' returned a row with {} cells for {} columns",
                    row.len(),
                    columns.len()
                )));
            }

            let record = decode(row.cells(), &columns, &classification)?;
            sink.accept(&self.config.measurement, record);
            emitted += 1;
        }

        debug!("Query '{}' emitted {} records", sql, emitted);
        Ok(emitted)
    }
}

/// Runs one polling cycle of `config` against `executor`.
pub async fn run(
    config: &RunConfig,
    executor: &dyn QueryExecutor,
    sink: &mut dyn MetricSink,
) -> Result<RunSummary> {
    QueryRunner::new(executor, config).run(sink).await
}
