//! SQLite query executor.

use super::cursor::SqlxCursor;
use super::{QueryExecutor, ResultCursor};
use crate::config::DatabaseConfig;
use crate::error::{CollectorError, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteQueryResult, SqliteRow};
use std::time::Duration;
use tracing::debug;

/// SQLite query executor.
///
/// SQLite converts every storage class to text on request, so integers and
/// reals reach the decoder in their canonical decimal form.
#[derive(Debug)]
pub struct SqliteExecutor {
    pool: SqlitePool,
    query_timeout: Option<Duration>,
}

impl SqliteExecutor {
    /// Opens the configured database.
    ///
    /// An in-memory database lives only as long as its connection, so it is
    /// held on a single connection that is never recycled.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut options = SqlitePoolOptions::new();
        if is_in_memory(&config.url) {
            options = options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            options = options.max_connections(config.max_connections);
        }

        let pool = options.connect(&config.url).await.map_err(|e| {
            CollectorError::connection(format!(
                "Cannot open {}: {e}",
                config.display_string()
            ))
        })?;
        debug!("Opened SQLite database {}", config.display_string());

        Ok(Self {
            pool,
            query_timeout: config.query_timeout,
        })
    }

    /// Creates an executor from an existing connection pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            query_timeout: None,
        }
    }

    /// Sets the time allowed for a query to start returning rows.
    pub fn with_query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    async fn execute<'a>(&'a self, sql: &'a str) -> Result<Box<dyn ResultCursor + 'a>> {
        let stream = sqlx::raw_sql(sql).fetch_many(&self.pool);
        let cursor = SqlxCursor::<SqliteQueryResult, SqliteRow>::open(
            stream,
            self.query_timeout,
            |e| e.to_string(),
        )
        .await?;
        Ok(Box::new(cursor))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
