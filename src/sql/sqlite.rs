//! SQLite cell decoding.
//!
//! SQLite only stores INTEGER, REAL, TEXT and BLOB. The declared column type
//! decides booleans and timestamps; everything else follows the value's
//! storage class. A DATETIME column may hold any value, so cells that do not
//! parse as a timestamp fall back to their storage class.

use super::DecodeCell;
use crate::value::RawValue;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

impl DecodeCell for SqliteRow {
    fn decode_cell(&self, index: usize) -> Result<RawValue, sqlx::Error> {
        let value = self.try_get_raw(index)?;
        if value.is_null() {
            return Ok(RawValue::Null);
        }
        let storage = value.type_info().name().to_string();
        let column = self.column(index);
        let declared = column.type_info().name().to_ascii_uppercase();

        if declared == "DATETIME" {
            if let Ok(t) = self.try_get::<DateTime<Utc>, _>(index) {
                return Ok(RawValue::from(t));
            }
        }

        let raw = match (declared.as_str(), storage.as_str()) {
            ("BOOLEAN", "INTEGER") => RawValue::Bool(self.try_get(index)?),
            (_, "INTEGER") => RawValue::Int(self.try_get(index)?),
            (_, "REAL") => RawValue::Float(self.try_get(index)?),
            (_, "TEXT") => RawValue::Text(self.try_get(index)?),
            (_, "BLOB") => RawValue::Bytes(self.try_get(index)?),
            (_, other) => {
                return Err(sqlx::Error::ColumnDecode {
                    index: format!("{:?}", column.name()),
                    source: format!("unrecognized storage class {}", other).into(),
                })
            }
        };
        Ok(raw)
    }
}
