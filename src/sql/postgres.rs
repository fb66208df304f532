//! PostgreSQL cell decoding.

use super::DecodeCell;
use crate::value::RawValue;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::postgres::types::{Oid, PgInterval, PgMoney, PgTimeTz};
use sqlx::postgres::{PgRow, PgTypeKind, PgValueFormat};
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// Fraction digits assumed for MONEY (the `C`/`en_US` `lc_monetary`).
const MONEY_SCALE: u32 = 2;

fn array<T: Into<Value>>(items: Vec<Option<T>>) -> RawValue {
    RawValue::Other(Value::Array(
        items
            .into_iter()
            .map(|v| v.map(Into::into).unwrap_or(Value::Null))
            .collect(),
    ))
}

fn text(s: impl ToString) -> RawValue {
    RawValue::Other(Value::String(s.to_string()))
}

/// Widen through the shortest decimal form, so REAL 0.1 stays 0.1.
fn widen_f32(v: f32) -> f64 {
    v.to_string().parse().unwrap_or(f64::from(v))
}

/// ISO 8601 duration, e.g. `P1Y2M3DT4H5M6.5S`; zero is `PT0S`.
fn interval_text(i: &PgInterval) -> String {
    let mut out = String::from("P");
    let (years, months) = (i.months / 12, i.months % 12);
    if years != 0 {
        out.push_str(&format!("{}Y", years));
    }
    if months != 0 {
        out.push_str(&format!("{}M", months));
    }
    if i.days != 0 {
        out.push_str(&format!("{}D", i.days));
    }
    if i.microseconds != 0 {
        let sign = if i.microseconds < 0 { "-" } else { "" };
        let abs = i.microseconds.unsigned_abs();
        let hours = abs / 3_600_000_000;
        let minutes = (abs / 60_000_000) % 60;
        let seconds = (abs / 1_000_000) % 60;
        let fraction = abs % 1_000_000;
        out.push('T');
        if hours != 0 {
            out.push_str(&format!("{}{}H", sign, hours));
        }
        if minutes != 0 {
            out.push_str(&format!("{}{}M", sign, minutes));
        }
        if fraction != 0 {
            let digits = format!("{:06}", fraction);
            out.push_str(&format!("{}{}.{}S", sign, seconds, digits.trim_end_matches('0')));
        } else if seconds != 0 {
            out.push_str(&format!("{}{}S", sign, seconds));
        }
    }
    if out == "P" {
        out.push_str("T0S");
    }
    out
}

impl DecodeCell for PgRow {
    fn decode_cell(&self, index: usize) -> Result<RawValue, sqlx::Error> {
        let value = self.try_get_raw(index)?;
        if value.is_null() {
            return Ok(RawValue::Null);
        }
        let column = self.column(index);
        let type_info = column.type_info();
        let type_name = type_info.name().to_ascii_uppercase();
        let raw = match type_name.as_str() {
            "BOOL" => RawValue::Bool(self.try_get(index)?),
            "INT2" => RawValue::Int(self.try_get::<i16, _>(index)?.into()),
            "INT4" => RawValue::Int(self.try_get::<i32, _>(index)?.into()),
            "INT8" => RawValue::Int(self.try_get(index)?),
            "OID" => RawValue::Int(self.try_get::<Oid, _>(index)?.0.into()),
            "FLOAT4" => RawValue::Float(widen_f32(self.try_get(index)?)),
            "FLOAT8" => RawValue::Float(self.try_get(index)?),
            // exact decimal text; a JSON number would round through f64
            "NUMERIC" => text(self.try_get::<Decimal, _>(index)?),
            "MONEY" => text(self.try_get::<PgMoney, _>(index)?.to_decimal(MONEY_SCALE)),
            // CHAR is bpchar; "CHAR" with quotes is the single-byte internal type
            "TEXT" | "VARCHAR" | "CHAR" | "NAME" | "CITEXT" | "UNKNOWN" => {
                RawValue::Text(self.try_get(index)?)
            }
            "\"CHAR\"" => RawValue::Text(char::from(self.try_get::<i8, _>(index)? as u8).to_string()),
            "BYTEA" => RawValue::Bytes(self.try_get(index)?),
            "TIMESTAMPTZ" => RawValue::from(self.try_get::<DateTime<Utc>, _>(index)?),
            "TIMESTAMP" => RawValue::naive_timestamp(self.try_get(index)?),
            "DATE" => text(self.try_get::<NaiveDate, _>(index)?.format("%Y-%m-%d")),
            "TIME" => text(self.try_get::<NaiveTime, _>(index)?.format("%H:%M:%S%.f")),
            "TIMETZ" => {
                let t = self.try_get::<PgTimeTz<NaiveTime, FixedOffset>, _>(index)?;
                text(format!("{}{}", t.time.format("%H:%M:%S%.f"), t.offset))
            }
            "INTERVAL" => text(interval_text(&self.try_get::<PgInterval, _>(index)?)),
            "UUID" => text(self.try_get::<uuid::Uuid, _>(index)?),
            "JSON" | "JSONB" => RawValue::Other(self.try_get::<Value, _>(index)?),
            "TEXT[]" | "VARCHAR[]" | "CHAR[]" | "NAME[]" => {
                array(self.try_get::<Vec<Option<String>>, _>(index)?)
            }
            "INT2[]" => array(self.try_get::<Vec<Option<i16>>, _>(index)?),
            "INT4[]" => array(self.try_get::<Vec<Option<i32>>, _>(index)?),
            "INT8[]" => array(self.try_get::<Vec<Option<i64>>, _>(index)?),
            "FLOAT8[]" => array(self.try_get::<Vec<Option<f64>>, _>(index)?),
            "BOOL[]" => array(self.try_get::<Vec<Option<bool>>, _>(index)?),
            "NUMERIC[]" => array(
                self.try_get::<Vec<Option<Decimal>>, _>(index)?
                    .into_iter()
                    .map(|d| d.map(|d| d.to_string()))
                    .collect(),
            ),
            "UUID[]" => array(
                self.try_get::<Vec<Option<uuid::Uuid>>, _>(index)?
                    .into_iter()
                    .map(|u| u.map(|u| u.to_string()))
                    .collect(),
            ),
            other => {
                // enum labels travel as text in both wire formats
                let textual = matches!(value.format(), PgValueFormat::Text)
                    || matches!(type_info.kind(), PgTypeKind::Enum(_));
                if !textual {
                    return Err(sqlx::Error::ColumnDecode {
                        index: format!("{:?}", column.name()),
                        source: format!(
                            "no decoder for binary {} values; cast the column to text in the query",
                            other
                        )
                        .into(),
                    });
                }
                let bytes = value.as_bytes().map_err(|source| sqlx::Error::ColumnDecode {
                    index: format!("{:?}", column.name()),
                    source,
                })?;
                RawValue::Bytes(bytes.to_vec())
            }
        };
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProjectError;
    use crate::sql::fetch_records;
    use serde_json::json;
    use sqlx::postgres::PgPoolOptions;
    use sqlx::PgPool;

    /// Live-database tests only run when `DATABASE_URL` points at a server.
    async fn pool() -> Option<PgPool> {
        let url = std::env::var("DATABASE_URL").ok()?;
        Some(
            PgPoolOptions::new()
                .max_connections(1)
                .connect(&url)
                .await
                .unwrap(),
        )
    }

    #[test]
    fn real_values_keep_their_shortest_form() {
        assert_eq!(widen_f32(0.1), 0.1);
        assert_eq!(widen_f32(1.5), 1.5);
        assert_eq!(widen_f32(-3.25e10), -3.25e10);
    }

    #[test]
    fn intervals_render_as_iso8601() {
        let iv = |months, days, microseconds| PgInterval { months, days, microseconds };
        assert_eq!(interval_text(&iv(0, 0, 0)), "PT0S");
        assert_eq!(interval_text(&iv(0, 1, 0)), "P1D");
        assert_eq!(interval_text(&iv(14, 3, 0)), "P1Y2M3D");
        assert_eq!(interval_text(&iv(0, 1, 7_384_000_000)), "P1DT2H3M4S");
        assert_eq!(interval_text(&iv(0, 0, 6_500_000)), "PT6.5S");
        assert_eq!(interval_text(&iv(0, 0, -90_000_000)), "PT-1M-30S");
    }

    #[tokio::test]
    async fn scalar_types() {
        let Some(pool) = pool().await else { return };
        let records = fetch_records(
            &pool,
            r#"SELECT true AS b, 1::int2 AS i2, 2::int4 AS i4, 3::int8 AS i8, 42::oid AS o,
                0.1::float4 AS f4, 1.5::float8 AS f8, 12.50::numeric AS price, 12.34::money AS cash,
                'x'::text AS t, 'v'::varchar AS v, 'ab'::char(4) AS c, 'nm'::name AS n, 'z'::"char" AS ch,
                '\x68656c6c6f'::bytea AS raw,
                '2024-05-06 09:08:09+02'::timestamptz AS tz, '2024-05-06 07:08:09'::timestamp AS ts,
                '2024-05-06'::date AS d, '07:08:09.5'::time AS tm, '07:08:09+02'::timetz AS ttz,
                '1 day 02:03:04'::interval AS span,
                '00000000-0000-0000-0000-000000000001'::uuid AS u,
                '{"a": 1}'::jsonb AS jb, '[1]'::json AS j"#,
        )
        .await
        .unwrap();
        let r = &records[0];
        assert_eq!(r["b"], json!(true));
        assert_eq!(r["i2"], json!(1));
        assert_eq!(r["i4"], json!(2));
        assert_eq!(r["i8"], json!(3));
        assert_eq!(r["o"], json!(42));
        assert_eq!(r["f4"], json!(0.1));
        assert_eq!(r["f8"], json!(1.5));
        assert_eq!(r["price"], json!("12.50"));
        assert_eq!(r["cash"], json!("12.34"));
        assert_eq!(r["t"], json!("x"));
        assert_eq!(r["v"], json!("v"));
        assert_eq!(r["c"], json!("ab  "));
        assert_eq!(r["n"], json!("nm"));
        assert_eq!(r["ch"], json!("z"));
        assert_eq!(r["raw"], json!("hello"));
        assert_eq!(r["tz"], json!("2024-05-06T07:08:09.000000+00:00"));
        assert_eq!(r["ts"], r["tz"]);
        assert_eq!(r["d"], json!("2024-05-06"));
        assert_eq!(r["tm"], json!("07:08:09.500"));
        assert_eq!(r["ttz"], json!("07:08:09+02:00"));
        assert_eq!(r["span"], json!("P1DT2H3M4S"));
        assert_eq!(r["u"], json!("00000000-0000-0000-0000-000000000001"));
        assert_eq!(r["jb"], json!({"a": 1}));
        assert_eq!(r["j"], json!([1]));
    }

    #[tokio::test]
    async fn typed_nulls_stay_null() {
        let Some(pool) = pool().await else { return };
        let records = fetch_records(
            &pool,
            "SELECT NULL::bool AS b, NULL::int4 AS i, NULL::float4 AS f, NULL::numeric AS n,
                NULL::char(2) AS c, NULL::bytea AS raw, NULL::timestamptz AS tz, NULL::date AS d,
                NULL::interval AS span, NULL::uuid AS u, NULL::jsonb AS jb, NULL::text[] AS arr,
                NULL::inet AS ip",
        )
        .await
        .unwrap();
        assert_eq!(records[0].len(), 13);
        assert!(records[0].values().all(Value::is_null));
    }

    #[tokio::test]
    async fn array_types() {
        let Some(pool) = pool().await else { return };
        let records = fetch_records(
            &pool,
            "SELECT ARRAY['a', NULL]::text[] AS t, ARRAY['x']::char(2)[] AS c,
                ARRAY[1, NULL]::int2[] AS i2, ARRAY[1, NULL]::int4[] AS i4, ARRAY[7]::int8[] AS i8,
                ARRAY[1.5]::float8[] AS f, ARRAY[true, false]::bool[] AS b,
                ARRAY[1.10]::numeric[] AS n,
                ARRAY['00000000-0000-0000-0000-000000000002']::uuid[] AS u",
        )
        .await
        .unwrap();
        let r = &records[0];
        assert_eq!(r["t"], json!(["a", null]));
        assert_eq!(r["c"], json!(["x "]));
        assert_eq!(r["i2"], json!([1, null]));
        assert_eq!(r["i4"], json!([1, null]));
        assert_eq!(r["i8"], json!([7]));
        assert_eq!(r["f"], json!([1.5]));
        assert_eq!(r["b"], json!([true, false]));
        assert_eq!(r["n"], json!(["1.10"]));
        assert_eq!(r["u"], json!(["00000000-0000-0000-0000-000000000002"]));
    }

    #[tokio::test]
    async fn enum_labels_come_through_as_text() {
        let Some(pool) = pool().await else { return };
        sqlx::query(
            "DO $$ BEGIN
                CREATE TYPE row_projector_mood AS ENUM ('happy', 'sad');
            EXCEPTION WHEN duplicate_object THEN NULL;
            END $$",
        )
        .execute(&pool)
        .await
        .unwrap();
        let records = fetch_records(&pool, "SELECT 'happy'::row_projector_mood AS mood")
            .await
            .unwrap();
        assert_eq!(records[0]["mood"], json!("happy"));
    }

    #[tokio::test]
    async fn binary_values_without_a_decoder_fail_loudly() {
        let Some(pool) = pool().await else { return };
        let err = fetch_records(&pool, "SELECT '10.0.0.1'::inet AS ip")
            .await
            .unwrap_err();
        assert!(matches!(err, ProjectError::RowScan { row: 0, .. }));
        let records = fetch_records(&pool, "SELECT '10.0.0.1'::inet::text AS ip")
            .await
            .unwrap();
        assert_eq!(records[0]["ip"], json!("10.0.0.1"));
    }

    #[tokio::test]
    async fn users_scenario() {
        let Some(pool) = pool().await else { return };
        let records = fetch_records(
            &pool,
            "SELECT * FROM (VALUES
                (1::int8, 'Ada'::text, NULL::text, '2024-05-06 07:08:09+00'::timestamptz, true),
                (2::int8, 'Grace'::text, 'grace@example.com'::text, '2024-05-06 09:08:09+02'::timestamptz, false)
            ) AS users(id, name, email, created_at, is_active)",
        )
        .await
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["email"], Value::Null);
        for r in &records {
            let keys: Vec<&str> = r.keys().map(String::as_str).collect();
            assert_eq!(keys, ["id", "name", "email", "created_at", "is_active"]);
            assert!(r["id"].is_i64());
            assert_eq!(r["created_at"], json!("2024-05-06T07:08:09.000000+00:00"));
        }
        assert_eq!(records[1]["is_active"], json!(false));
    }
}
