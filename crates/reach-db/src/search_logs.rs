//! Insert-only audit log of discovery searches (`search_query_logs`).

use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone)]
pub struct NewSearchLog<'a> {
    pub user_id: Option<Uuid>,
    pub platform: &'a str,
    pub filters: &'a serde_json::Value,
    pub result_count: i32,
    pub estimated_credits: f64,
    pub actual_credits: Option<f64>,
}

/// Records one search. Returns the new row id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_search_log(pool: &PgPool, log: &NewSearchLog<'_>) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO search_query_logs \
             (user_id, platform, filters, result_count, estimated_credits, actual_credits) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id",
    )
    .bind(log.user_id)
    .bind(log.platform)
    .bind(log.filters)
    .bind(log.result_count)
    .bind(log.estimated_credits)
    .bind(log.actual_credits)
    .fetch_one(pool)
    .await?;

    Ok(id)
}
