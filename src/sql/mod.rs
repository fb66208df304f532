//! sqlx adapters: decode driver cells into [`RawValue`](crate::value::RawValue)s and expose
//! result streams as [`Cursor`](crate::cursor::Cursor)s.

mod cursor;
mod postgres;
mod sqlite;

pub use cursor::{fetch_records, SqlxCursor};

use crate::value::RawValue;

/// Decode one cell of a driver row, dispatching on the SQL type the driver
/// reports for it.
pub trait DecodeCell {
    fn decode_cell(&self, index: usize) -> Result<RawValue, sqlx::Error>;
}
