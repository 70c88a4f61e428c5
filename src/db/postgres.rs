//! PostgreSQL query executor.
//!
//! Provides the `PostgresExecutor` struct that implements the `QueryExecutor`
//! trait for PostgreSQL databases using sqlx.

use super::cursor::SqlxCursor;
use super::{QueryExecutor, ResultCursor};
use crate::config::DatabaseConfig;
use crate::error::{CollectorError, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgQueryResult, PgRow};
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum number of connection attempts.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay between retry attempts (doubles each retry).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Time allowed to acquire a pooled connection.
const ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// PostgreSQL query executor.
///
/// Queries run over the simple query protocol, so every cell comes back in
/// the server's text format regardless of its column type.
#[derive(Debug)]
pub struct PostgresExecutor {
    pool: PgPool,
    query_timeout: Option<Duration>,
}

impl PostgresExecutor {
    /// Connects to the configured server.
    ///
    /// Transient failures (refused connections, timeouts) are retried with
    /// exponential backoff; anything else fails immediately.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut last_error = None;
        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);

        for attempt in 1..=MAX_RETRY_ATTEMPTS {
            debug!("Connection attempt {} of {}", attempt, MAX_RETRY_ATTEMPTS);

            let result = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
                .connect(&config.url)
                .await;

            match result {
                Ok(pool) => {
                    debug!("Successfully connected to database");
                    return Ok(Self {
                        pool,
                        query_timeout: config.query_timeout,
                    });
                }
                Err(e) => {
                    let is_transient = is_transient_error(&e);
                    if attempt < MAX_RETRY_ATTEMPTS && is_transient {
                        warn!(
                            "Connection attempt {} failed (transient error), retrying in {:?}",
                            attempt, delay
                        );
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                        last_error = Some(e);
                    } else {
                        return Err(map_connection_error(e, config));
                    }
                }
            }
        }

        match last_error {
            Some(e) => Err(map_connection_error(e, config)),
            None => Err(CollectorError::connection(format!(
                "Cannot connect to {}",
                config.display_string()
            ))),
        }
    }

    /// Creates an executor from an existing connection pool.
    pub fn from_pool(pool: PgPool) -> Self {
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
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl QueryExecutor for PostgresExecutor {
    async fn execute<'a>(&'a self, sql: &'a str) -> Result<Box<dyn ResultCursor + 'a>> {
        let stream = sqlx::raw_sql(sql).fetch_many(&self.pool);
        let cursor = SqlxCursor::<PgQueryResult, PgRow>::open(
            stream,
            self.query_timeout,
            format_query_error,
        )
        .await?;
        Ok(Box::new(cursor))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Determines if an error is transient and worth retrying.
fn is_transient_error(error: &sqlx::Error) -> bool {
    if matches!(error, sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)) {
        return true;
    }

    let error_str = error.to_string().to_lowercase();
    error_str.contains("connection refused")
        || error_str.contains("timed out")
        || error_str.contains("temporarily unavailable")
        || error_str.contains("connection reset")
        || error_str.contains("broken pipe")
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &DatabaseConfig) -> CollectorError {
    let target = config.display_string();
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        CollectorError::connection(format!(
            "Cannot connect to {target}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        CollectorError::connection(format!(
            "Authentication failed for {target}. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        CollectorError::connection(format!("Database at {target} does not exist."))
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        CollectorError::connection(
            "Server requires SSL. Add '?sslmode=require' to server_url.".to_string(),
        )
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        CollectorError::connection(format!(
            "Connection to {target} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        CollectorError::connection(error.to_string())
    }
}

/// Formats a query error with detail and hint lines when the server sent them.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from("ERROR: ");
    result.push_str(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }

        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }

        if let Some(table) = pg_error.table() {
            result.push_str("\n  TABLE: ");
            result.push_str(table);
        }

        if let Some(column) = pg_error.column() {
            result.push_str("\n  COLUMN: ");
            result.push_str(column);
        }
    }

    result
}
