//! User read handlers. Rows go through the projector untouched, so the JSON
//! mirrors whatever columns the query returns.

use crate::error::AppError;
use crate::response::{success_many, success_one};
use crate::sql::fetch_records;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

const LIST_SQL: &str = "SELECT id, name, email, created_at, is_active FROM users ORDER BY id LIMIT $1 OFFSET $2";
const READ_SQL: &str = "SELECT id, name, email, created_at, is_active FROM users WHERE id = $1";

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListParams {
    /// Limit defaults to 100 and is clamped to 1..=1000; offset must not be negative.
    fn resolve(&self) -> Result<(i64, i64), AppError> {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = self.offset.unwrap_or(0);
        if offset < 0 {
            return Err(AppError::BadRequest("offset must not be negative".into()));
        }
        Ok((limit, offset))
    }
}

fn parse_id(id: &str) -> Result<i64, AppError> {
    id.parse().map_err(|_| AppError::BadRequest("invalid id".into()))
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset) = params.resolve()?;
    tracing::debug!(limit, offset, "list users");
    let query = sqlx::query(LIST_SQL).bind(limit).bind(offset);
    let rows = fetch_records(&state.pool, query).await?;
    Ok(success_many(rows))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let query = sqlx::query(READ_SQL).bind(id);
    let row = fetch_records(&state.pool, query)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("user {}", id)))?;
    Ok(success_one(row))
}
