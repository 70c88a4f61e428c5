//! Mock query executors for testing.
//!
//! Provides scripted in-memory results so the runner can be exercised
//! without a database.

use super::{QueryExecutor, ResultCursor, RowBuffer};
use crate::error::{CollectorError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A scripted result set.
#[derive(Debug, Clone, Default)]
pub struct MockResult {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
    fail_after: Option<(usize, String)>,
}

impl MockResult {
    /// Creates an empty result with the given columns.
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Appends a row. `None` cells are NULL.
    pub fn with_row(mut self, cells: &[Option<&str>]) -> Self {
        self.rows
            .push(cells.iter().map(|c| c.map(str::to_string)).collect());
        self
    }

    /// Makes row fetching fail once `rows` rows have been delivered.
    pub fn failing_after(mut self, rows: usize, message: impl Into<String>) -> Self {
        self.fail_after = Some((rows, message.into()));
        self
    }
}

#[derive(Debug)]
enum Scripted {
    Rows(MockResult),
    Error(String),
}

/// A mock executor that returns predefined results per query text.
///
/// Unscripted SELECT statements return a single text column; anything else
/// returns an empty result.
#[derive(Debug, Default)]
pub struct MockExecutor {
    scripts: HashMap<String, Scripted>,
    executed: Mutex<Vec<String>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

impl MockExecutor {
    /// Creates a mock executor with no scripted queries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the result of `sql`.
    pub fn with_result(mut self, sql: impl Into<String>, result: MockResult) -> Self {
        self.scripts.insert(sql.into(), Scripted::Rows(result));
        self
    }

    /// Makes `sql` fail at execution time.
    pub fn with_error(mut self, sql: impl Into<String>, message: impl Into<String>) -> Self {
        self.scripts
            .insert(sql.into(), Scripted::Error(message.into()));
        self
    }

    /// Queries executed so far, in order.
    pub fn executed_queries(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|queries| queries.clone())
            .unwrap_or_default()
    }

    /// Number of cursors handed out.
    pub fn opened_cursors(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of cursors that were closed.
    pub fn closed_cursors(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    fn default_result(sql: &str) -> MockResult {
        if sql.trim_start().to_uppercase().starts_with("SELECT") {
            let text = format!("Mock result for: {sql}");
            MockResult::new(&["result"]).with_row(&[Some(text.as_str())])
        } else {
            MockResult::default()
        }
    }
}

#[async_trait]
impl QueryExecutor for MockExecutor {
    async fn execute<'a>(&'a self, sql: &'a str) -> Result<Box<dyn ResultCursor + 'a>> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }

        let result = match self.scripts.get(sql) {
            Some(Scripted::Error(message)) => return Err(CollectorError::query(message.clone())),
            Some(Scripted::Rows(result)) => result.clone(),
            None => Self::default_result(sql),
        };

        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockCursor {
            result,
            next: 0,
            open: true,
            closed: &self.closed,
        }))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

struct MockCursor<'a> {
    result: MockResult,
    next: usize,
    open: bool,
    closed: &'a AtomicUsize,
}

#[async_trait]
impl<'a> ResultCursor for MockCursor<'a> {
    fn column_names(&self) -> Result<Vec<String>> {
        Ok(self.result.columns.clone())
    }

    async fn next_row(&mut self, row: &mut RowBuffer) -> Result<bool> {
        if !self.open {
            return Ok(false);
        }
        if let Some((limit, message)) = &self.result.fail_after {
            if self.next >= *limit {
                return Err(CollectorError::query(message.clone()));
            }
        }

        let Some(cells) = self.result.rows.get(self.next) else {
            return Ok(false);
        };
        row.fill(cells.iter().map(|c| c.as_deref()));
        self.next += 1;
        Ok(true)
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// An executor whose every query fails, for exercising error paths.
#[derive(Debug, Clone)]
pub struct FailingExecutor {
    message: String,
}

impl FailingExecutor {
    /// Creates an executor that fails every query with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl QueryExecutor for FailingExecutor {
    async fn execute<'a>(&'a self, _sql: &'a str) -> Result<Box<dyn ResultCursor + 'a>> {
        Err(CollectorError::query(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
