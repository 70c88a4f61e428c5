//! Streaming cursor shared by the sqlx-backed executors.

use super::{ResultCursor, RowBuffer};
use crate::error::{CollectorError, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::TryStreamExt;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row};
use sqlx::Either;
use std::borrow::Cow;
use std::time::Duration;

/// Items of a `fetch_many` stream: a statement's completion or one of its rows.
pub(crate) type ResultStream<'a, Q, R> =
    BoxStream<'a, std::result::Result<Either<Q, R>, sqlx::Error>>;

/// A driver row whose cells can be read back as text.
pub(crate) trait TextRow: Row {
    /// Reads the cell at `index` as text without checking its SQL type.
    fn text_at(&self, index: usize) -> std::result::Result<Option<Cow<'_, str>>, sqlx::Error>;
}

impl TextRow for PgRow {
    // The simple query protocol delivers text in the UTF-8 client encoding.
    fn text_at(&self, index: usize) -> std::result::Result<Option<Cow<'_, str>>, sqlx::Error> {
        Ok(self
            .try_get_unchecked::<Option<&str>, _>(index)?
            .map(Cow::Borrowed))
    }
}

impl TextRow for SqliteRow {
    // BLOBs need not be UTF-8; invalid sequences become U+FFFD.
    fn text_at(&self, index: usize) -> std::result::Result<Option<Cow<'_, str>>, sqlx::Error> {
        Ok(self
            .try_get_unchecked::<Option<&[u8]>, _>(index)?
            .map(String::from_utf8_lossy))
    }
}

/// Forward-only cursor over the first result set of a sqlx stream.
///
/// The first row is fetched when the cursor is opened so that statement
/// errors surface at execution time and column names are known up front.
/// Rows of any statement after the first are never read.
pub(crate) struct SqlxCursor<'a, Q, R> {
    stream: Option<ResultStream<'a, Q, R>>,
    columns: Vec<String>,
    pending: Option<R>,
}

impl<'a, Q: Send, R: TextRow> SqlxCursor<'a, Q, R> {
    /// Opens a cursor, waiting at most `timeout` for the first row.
    pub(crate) async fn open(
        stream: ResultStream<'a, Q, R>,
        timeout: Option<Duration>,
        format_error: fn(sqlx::Error) -> String,
    ) -> Result<Self> {
        let mut cursor = Self {
            stream: Some(stream),
            columns: Vec::new(),
            pending: None,
        };

        let first = match timeout {
            Some(limit) => tokio::time::timeout(limit, cursor.fetch())
                .await
                .map_err(|_| {
                    CollectorError::query(format!(
                        "Query timed out after {} seconds",
                        limit.as_secs()
                    ))
                })?,
            None => cursor.fetch().await,
        }
        .map_err(|e| CollectorError::query(format_error(e)))?;

        // A result without rows carries no column metadata; nothing will be
        // decoded from it either.
        let columns = first
            .as_ref()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|col| col.name().to_string())
                    .collect()
            })
            .unwrap_or_default();

        cursor.columns = columns;
        cursor.pending = first;
        Ok(cursor)
    }

    /// Next row of the first result set. The stream is dropped once that
    /// statement completes.
    async fn fetch(&mut self) -> std::result::Result<Option<R>, sqlx::Error> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };
        match stream.try_next().await? {
            Some(Either::Right(row)) => Ok(Some(row)),
            Some(Either::Left(_)) | None => {
                self.stream = None;
                Ok(None)
            }
        }
    }

    fn fill(&self, row: &R, buffer: &mut RowBuffer) -> Result<()> {
        let width = row.len();
        if width != self.columns.len() {
            return Err(CollectorError::query(format!(
                "Row has {width} cells but the result has {} columns",
                self.columns.len()
            )));
        }

        buffer.reset(width);
        for index in 0..width {
            let text = row.text_at(index).map_err(|e| {
                CollectorError::query(format!(
                    "Cannot read column '{}' as text: {e}",
                    self.columns[index]
                ))
            })?;
            buffer.set(index, text.as_deref());
        }
        Ok(())
    }
}

#[async_trait]
impl<'a, Q: Send, R: TextRow> ResultCursor for SqlxCursor<'a, Q, R> {
    fn column_names(&self) -> Result<Vec<String>> {
        Ok(self.columns.clone())
    }

    async fn next_row(&mut self, buffer: &mut RowBuffer) -> Result<bool> {
        let row = match self.pending.take() {
            Some(row) => row,
            None => match self
                .fetch()
                .await
                .map_err(|e| CollectorError::query(format!("Failed to fetch row: {e}")))?
            {
                Some(row) => row,
                None => return Ok(false),
            },
        };

        self.fill(&row, buffer)?;
        Ok(true)
    }

    fn close(&mut self) {
        self.pending = None;
        self.stream = None;
    }
}
