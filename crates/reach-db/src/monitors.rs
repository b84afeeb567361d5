//! Database operations for `brand_monitors` and `monitor_hits`.

use chrono::{DateTime, Utc};
use reach_core::{MonitorRule, ObservedPost, Platform};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{to_i64, to_u64, DbError};

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `brand_monitors` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrandMonitorRow {
    pub id: i64,
    pub public_id: Uuid,
    pub owner_user_id: Uuid,
    pub name: String,
    pub keywords: Vec<String>,
    pub hashtags: Vec<String>,
    pub platforms: Vec<String>,
    pub min_followers: Option<i64>,
    pub min_engagement_rate: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BrandMonitorRow {
    /// Rebuilds the match rule stored on this row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidRow`] if a stored platform no longer parses.
    pub fn rule(&self) -> Result<MonitorRule, DbError> {
        let platforms = self
            .platforms
            .iter()
            .map(|p| {
                p.parse::<Platform>()
                    .map_err(|_| DbError::InvalidRow(format!("monitor platform '{p}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MonitorRule {
            keywords: self.keywords.clone(),
            hashtags: self.hashtags.clone(),
            platforms,
            min_followers: self.min_followers.map(to_u64),
            min_engagement_rate: self.min_engagement_rate,
        })
    }
}

/// A row from the `monitor_hits` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MonitorHitRow {
    pub id: i64,
    pub monitor_id: i64,
    pub platform: String,
    pub external_post_id: String,
    pub author_username: Option<String>,
    pub content: String,
    pub url: Option<String>,
    pub follower_count: Option<i64>,
    pub engagement_rate: Option<f64>,
    pub matched_terms: Vec<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub detected_at: DateTime<Utc>,
}

/// User-editable monitor attributes. The rule should already be normalized.
#[derive(Debug, Clone)]
pub struct MonitorFields<'a> {
    pub name: &'a str,
    pub rule: &'a MonitorRule,
    pub is_active: bool,
}

/// A matched post ready to be recorded against a monitor.
#[derive(Debug, Clone)]
pub struct NewMonitorHit<'a> {
    pub post: &'a ObservedPost,
    pub matched_terms: &'a [String],
}

fn platform_names(rule: &MonitorRule) -> Vec<&'static str> {
    rule.platforms.iter().map(|p| p.as_str()).collect()
}

const MONITOR_COLUMNS: &str = "id, public_id, owner_user_id, name, keywords, hashtags, platforms, \
     min_followers, min_engagement_rate, is_active, created_at, updated_at";

// ---------------------------------------------------------------------------
// brand_monitors operations
// ---------------------------------------------------------------------------

/// Creates a monitor owned by `owner_user_id` and returns the inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_monitor(
    pool: &PgPool,
    owner_user_id: Uuid,
    fields: &MonitorFields<'_>,
) -> Result<BrandMonitorRow, DbError> {
    let sql = format!(
        "INSERT INTO brand_monitors \
             (owner_user_id, name, keywords, hashtags, platforms, min_followers, \
              min_engagement_rate, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {MONITOR_COLUMNS}"
    );
    let row = sqlx::query_as::<_, BrandMonitorRow>(&sql)
        .bind(owner_user_id)
        .bind(fields.name)
        .bind(&fields.rule.keywords)
        .bind(&fields.rule.hashtags)
        .bind(platform_names(fields.rule))
        .bind(fields.rule.min_followers.map(to_i64))
        .bind(fields.rule.min_engagement_rate)
        .bind(fields.is_active)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// Replaces the editable attributes of a monitor the caller owns.
///
/// Returns `None` if no such monitor exists for the owner.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_monitor(
    pool: &PgPool,
    owner_user_id: Uuid,
    public_id: Uuid,
    fields: &MonitorFields<'_>,
) -> Result<Option<BrandMonitorRow>, DbError> {
    let sql = format!(
        "UPDATE brand_monitors SET \
             name                = $3, \
             keywords            = $4, \
             hashtags            = $5, \
             platforms           = $6, \
             min_followers       = $7, \
             min_engagement_rate = $8, \
             is_active           = $9, \
             updated_at          = NOW() \
         WHERE owner_user_id = $1 AND public_id = $2 \
         RETURNING {MONITOR_COLUMNS}"
    );
    let row = sqlx::query_as::<_, BrandMonitorRow>(&sql)
        .bind(owner_user_id)
        .bind(public_id)
        .bind(fields.name)
        .bind(&fields.rule.keywords)
        .bind(&fields.rule.hashtags)
        .bind(platform_names(fields.rule))
        .bind(fields.rule.min_followers.map(to_i64))
        .bind(fields.rule.min_engagement_rate)
        .bind(fields.is_active)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Returns every monitor owned by `owner_user_id`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_monitors(
    pool: &PgPool,
    owner_user_id: Uuid,
) -> Result<Vec<BrandMonitorRow>, DbError> {
    let sql = format!(
        "SELECT {MONITOR_COLUMNS} FROM brand_monitors \
         WHERE owner_user_id = $1 \
         ORDER BY created_at DESC"
    );
    let rows = sqlx::query_as::<_, BrandMonitorRow>(&sql)
        .bind(owner_user_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Returns the active monitors owned by `owner_user_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_monitors(
    pool: &PgPool,
    owner_user_id: Uuid,
) -> Result<Vec<BrandMonitorRow>, DbError> {
    let sql = format!(
        "SELECT {MONITOR_COLUMNS} FROM brand_monitors \
         WHERE owner_user_id = $1 AND is_active = true \
         ORDER BY created_at DESC"
    );
    let rows = sqlx::query_as::<_, BrandMonitorRow>(&sql)
        .bind(owner_user_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Returns one monitor by public id, scoped to its owner.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_monitor(
    pool: &PgPool,
    owner_user_id: Uuid,
    public_id: Uuid,
) -> Result<Option<BrandMonitorRow>, DbError> {
    let sql = format!(
        "SELECT {MONITOR_COLUMNS} FROM brand_monitors \
         WHERE owner_user_id = $1 AND public_id = $2"
    );
    let row = sqlx::query_as::<_, BrandMonitorRow>(&sql)
        .bind(owner_user_id)
        .bind(public_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Deletes a monitor (and, by cascade, its hits).
///
/// Returns `true` if a row was removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_monitor(
    pool: &PgPool,
    owner_user_id: Uuid,
    public_id: Uuid,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "DELETE FROM brand_monitors \
         WHERE owner_user_id = $1 AND public_id = $2",
    )
    .bind(owner_user_id)
    .bind(public_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// monitor_hits operations
// ---------------------------------------------------------------------------

/// Records a hit for `monitor_id`.
///
/// A post already recorded for the monitor is skipped via `ON CONFLICT DO
/// NOTHING`. Returns `true` when a new row was inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_monitor_hit(
    pool: &PgPool,
    monitor_id: i64,
    hit: &NewMonitorHit<'_>,
) -> Result<bool, DbError> {
    let post = hit.post;
    let result = sqlx::query(
        "INSERT INTO monitor_hits \
             (monitor_id, platform, external_post_id, author_username, content, url, \
              follower_count, engagement_rate, matched_terms, posted_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT (monitor_id, platform, external_post_id) DO NOTHING",
    )
    .bind(monitor_id)
    .bind(post.platform.as_str())
    .bind(&post.external_post_id)
    .bind(&post.author_username)
    .bind(&post.content)
    .bind(&post.url)
    .bind(post.follower_count.map(to_i64))
    .bind(post.engagement_rate)
    .bind(hit.matched_terms)
    .bind(post.posted_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Returns the most recent hits for a monitor, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_monitor_hits(
    pool: &PgPool,
    monitor_id: i64,
    limit: i64,
) -> Result<Vec<MonitorHitRow>, DbError> {
    let rows = sqlx::query_as::<_, MonitorHitRow>(
        "SELECT id, monitor_id, platform, external_post_id, author_username, content, url, \
                follower_count, engagement_rate, matched_terms, posted_at, detected_at \
         FROM monitor_hits \
         WHERE monitor_id = $1 \
         ORDER BY detected_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(monitor_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
