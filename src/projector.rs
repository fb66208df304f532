//! Drain a cursor into ordered, self-describing JSON records.

use crate::cursor::Cursor;
use crate::error::ProjectError;
use crate::value::{normalize, RawValue, Record};

/// Read every remaining row of `cursor` and normalize it into a [`Record`].
///
/// All or nothing: any failure discards the rows built so far and returns the
/// error tagged with the phase that failed. The cursor is left exhausted (or
/// wherever it failed) but is not closed; dropping it is the caller's job.
pub async fn project<C>(cursor: &mut C) -> Result<Vec<Record>, ProjectError>
where
    C: Cursor + ?Sized,
{
    let columns = cursor
        .columns()
        .map_err(|e| ProjectError::ColumnMetadata(Box::new(e)))?;

    let mut records = Vec::new();
    loop {
        let row = records.len();
        let has_row = cursor
            .advance()
            .await
            .map_err(|e| ProjectError::CursorRead { row, source: Box::new(e) })?;
        if !has_row {
            break;
        }

        let mut slots = vec![RawValue::Null; columns.len()];
        cursor
            .scan(&mut slots)
            .map_err(|e| ProjectError::RowScan { row, source: Box::new(e) })?;

        let mut record = Record::with_capacity(columns.len());
        for (name, raw) in columns.iter().zip(slots) {
            record.insert(name.clone(), normalize(raw));
        }
        records.push(record);
    }

    cursor
        .finish()
        .map_err(|e| ProjectError::CursorIteration(Box::new(e)))?;

    tracing::debug!(columns = columns.len(), rows = records.len(), "projected result set");
    Ok(records)
}
