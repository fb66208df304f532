//! Dynamic cell values and their normalization into JSON.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};

/// One decoded row: column name -> normalized value, in column order.
pub type Record = Map<String, Value>;

/// A cell as reported by the driver, before normalization.
///
/// Adapters pick the variant from the SQL type the driver reports for the
/// cell, never by probing Rust types.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RawValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Untyped byte buffer (BLOB, BYTEA, or text handed over as bytes).
    Bytes(Vec<u8>),
    Timestamp(DateTime<FixedOffset>),
    /// Anything else the adapter already rendered as JSON (uuid, date, json, arrays).
    Other(Value),
}

impl RawValue {
    /// Timestamp without offset information; taken to be UTC.
    pub fn naive_timestamp(t: chrono::NaiveDateTime) -> Self {
        RawValue::Timestamp(t.and_utc().fixed_offset())
    }
}

impl From<DateTime<Utc>> for RawValue {
    fn from(t: DateTime<Utc>) -> Self {
        RawValue::Timestamp(t.fixed_offset())
    }
}

/// Collapse a raw cell into its JSON representation.
///
/// Integers are never reinterpreted as booleans, even when a driver stores
/// booleans as 0/1. Byte buffers always come out as text; payloads that are
/// not valid UTF-8 get U+FFFD for the invalid sequences.
pub fn normalize(raw: RawValue) -> Value {
    match raw {
        RawValue::Null => Value::Null,
        RawValue::Bool(b) => Value::Bool(b),
        RawValue::Int(n) => Value::Number(n.into()),
        // JSON has no NaN or infinity
        RawValue::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        RawValue::Text(s) => Value::String(s),
        RawValue::Bytes(b) => Value::String(match String::from_utf8(b) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }),
        RawValue::Timestamp(t) => Value::String(format_timestamp(&t)),
        RawValue::Other(v) => v,
    }
}

/// Canonical timestamp text: UTC, microseconds, explicit `+00:00`.
/// e.g. `2024-01-02T03:04:05.000000+00:00`
pub fn format_timestamp(t: &DateTime<FixedOffset>) -> String {
    t.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Micros, false)
}
