//! Cursor over a live sqlx result stream.

use super::DecodeCell;
use crate::cursor::Cursor;
use crate::error::ProjectError;
use crate::projector::project;
use crate::value::{RawValue, Record};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::TryStreamExt;
use sqlx::{Column, Database, Execute, Executor, Row};

/// Forward-only cursor over the rows of one query.
///
/// Column names come from a `describe` of the statement, so they are known
/// before the first row arrives and also for empty results.
pub struct SqlxCursor<'c, DB: Database> {
    columns: Vec<String>,
    metadata_error: Option<sqlx::Error>,
    rows: BoxStream<'c, Result<DB::Row, sqlx::Error>>,
    current: Option<DB::Row>,
}

impl<'c, DB> SqlxCursor<'c, DB>
where
    DB: Database,
    DB::Row: DecodeCell,
{
    /// Describe `query` and start streaming its rows. Nothing fails here;
    /// errors surface from the cursor operations that hit them.
    ///
    /// The executor is used twice (describe, then fetch), so it must be
    /// `Copy`: `&Pool` works, `&mut PgConnection` and transactions do not.
    /// Every open costs one extra `describe` round trip.
    pub async fn open<'q, E, Q>(executor: E, query: Q) -> Self
    where
        'q: 'c,
        E: Executor<'c, Database = DB> + Copy,
        Q: Execute<'q, DB> + 'q,
    {
        let (columns, metadata_error) = match executor.describe(query.sql()).await {
            Ok(describe) => (
                describe.columns().iter().map(|c| c.name().to_string()).collect(),
                None,
            ),
            Err(e) => (Vec::new(), Some(e)),
        };
        Self {
            columns,
            metadata_error,
            rows: executor.fetch(query),
            current: None,
        }
    }
}

#[async_trait]
impl<'c, DB> Cursor for SqlxCursor<'c, DB>
where
    DB: Database,
    DB::Row: DecodeCell,
{
    type Error = sqlx::Error;

    fn columns(&mut self) -> Result<Vec<String>, sqlx::Error> {
        if let Some(e) = self.metadata_error.take() {
            return Err(e);
        }
        Ok(self.columns.clone())
    }

    async fn advance(&mut self) -> Result<bool, sqlx::Error> {
        self.current = None;
        self.current = self.rows.try_next().await?;
        Ok(self.current.is_some())
    }

    fn scan(&mut self, slots: &mut [RawValue]) -> Result<(), sqlx::Error> {
        let row = self
            .current
            .as_ref()
            .ok_or_else(|| sqlx::Error::Protocol("scan called without a current row".into()))?;
        if row.len() != slots.len() {
            return Err(sqlx::Error::Protocol(format!(
                "expected {} destination slots, row has {} columns",
                slots.len(),
                row.len()
            )));
        }
        for (index, slot) in slots.iter_mut().enumerate() {
            *slot = row.decode_cell(index)?;
        }
        Ok(())
    }
}

/// Run `query` and project every row it returns. Same executor limits as
/// [`SqlxCursor::open`].
pub async fn fetch_records<'c, 'q, DB, E, Q>(executor: E, query: Q) -> Result<Vec<Record>, ProjectError>
where
    'q: 'c,
    DB: Database,
    DB::Row: DecodeCell,
    E: Executor<'c, Database = DB> + Copy,
    Q: Execute<'q, DB> + 'q,
{
    let mut cursor = SqlxCursor::open(executor, query).await;
    project(&mut cursor).await
}
