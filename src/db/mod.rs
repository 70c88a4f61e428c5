//! Database abstraction layer for the collector.
//!
//! The metric mapping engine only sees the [`QueryExecutor`] and
//! [`ResultCursor`] traits, so it never depends on a specific driver.
//! Concrete executors are selected at runtime from the configured backend.

mod cursor;
mod mock;
mod postgres;
mod sqlite;
mod types;

pub use mock::{FailingExecutor, MockExecutor, MockResult};
pub use postgres::PostgresExecutor;
pub use sqlite::SqliteExecutor;
pub use types::{RawCell, RowBuffer};

use crate::config::DatabaseConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
    Sqlite,
}

impl DatabaseBackend {
    /// Returns the backend as a string for display and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Parses a backend from a driver name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Infers the backend from the scheme of a connection URL.
    pub fn from_url(server_url: &str) -> Option<Self> {
        let url = url::Url::parse(server_url).ok()?;
        match url.scheme() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

impl fmt::Display for DatabaseBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creates a query executor for the configured backend.
///
/// This is the central factory function for database connections.
pub async fn connect(config: &DatabaseConfig) -> Result<Box<dyn QueryExecutor>> {
    match config.backend {
        DatabaseBackend::Postgres => {
            let executor = PostgresExecutor::connect(config).await?;
            Ok(Box::new(executor))
        }
        DatabaseBackend::Sqlite => {
            let executor = SqliteExecutor::connect(config).await?;
            Ok(Box::new(executor))
        }
    }
}

/// Runs SQL text and hands back a forward-only cursor over the result.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Executes a query.
    ///
    /// Fails with a query error if the database rejects the statement.
    async fn execute<'a>(&'a self, sql: &'a str) -> Result<Box<dyn ResultCursor + 'a>>;

    /// Closes the underlying connections.
    async fn close(&self) -> Result<()>;
}

/// A forward-only view over one query's result rows.
///
/// Rows are produced lazily. Callers must invoke [`ResultCursor::close`] once
/// they are done, whether or not the rows were fully consumed.
#[async_trait]
pub trait ResultCursor: Send {
    /// Column names of the result, in row order.
    fn column_names(&self) -> Result<Vec<String>>;

    /// Advances to the next row, writing its cells into `row`.
    ///
    /// Returns `false` once the result is exhausted.
    async fn next_row(&mut self, row: &mut RowBuffer) -> Result<bool>;

    /// Releases the result. Further calls to `next_row` return `false`.
    fn close(&mut self);
}
