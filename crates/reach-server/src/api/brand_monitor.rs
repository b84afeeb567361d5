//! `brand-monitor`: saved keyword/hashtag monitors and the hits recorded
//! against them.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use reach_core::{match_post, MonitorRule, ObservedPost, Platform};
use reach_db::{BrandMonitorRow, MonitorFields, MonitorHitRow, NewMonitorHit};
use reach_providers::normalize::engagement_fraction;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::middleware::Caller;

use super::{
    json_body, normalize_limit, parse_action, success, ActionSet, AppState, FunctionError,
};

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(super) enum BrandMonitorAction {
    CreateMonitor(CreatePayload),
    UpdateMonitor(UpdatePayload),
    ListMonitors {},
    DeleteMonitor(MonitorRef),
    ListHits(HitsPayload),
    IngestPosts(IngestPayload),
}

impl ActionSet for BrandMonitorAction {
    const NAMES: &'static [&'static str] = &[
        "create_monitor",
        "update_monitor",
        "list_monitors",
        "delete_monitor",
        "list_hits",
        "ingest_posts",
    ];
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreatePayload {
    #[serde(default)]
    name: String,
    #[serde(flatten)]
    rule: MonitorRule,
    is_active: Option<bool>,
}

/// Fields left out keep their stored value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UpdatePayload {
    monitor_id: Uuid,
    name: Option<String>,
    keywords: Option<Vec<String>>,
    hashtags: Option<Vec<String>>,
    platforms: Option<Vec<Platform>>,
    min_followers: Option<u64>,
    min_engagement_rate: Option<f64>,
    is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MonitorRef {
    monitor_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct HitsPayload {
    monitor_id: Uuid,
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct IngestPayload {
    #[serde(default)]
    posts: Vec<ObservedPost>,
}

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MonitorView {
    id: Uuid,
    name: String,
    #[serde(flatten)]
    rule: MonitorRule,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BrandMonitorRow> for MonitorView {
    type Error = reach_db::DbError;

    fn try_from(row: BrandMonitorRow) -> Result<Self, Self::Error> {
        let rule = row.rule()?;
        Ok(Self {
            id: row.public_id,
            name: row.name,
            rule,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HitView {
    id: i64,
    platform: String,
    external_post_id: String,
    author_username: Option<String>,
    content: String,
    url: Option<String>,
    follower_count: Option<i64>,
    engagement_rate: Option<f64>,
    matched_terms: Vec<String>,
    posted_at: Option<DateTime<Utc>>,
    detected_at: DateTime<Utc>,
}

impl From<MonitorHitRow> for HitView {
    fn from(row: MonitorHitRow) -> Self {
        Self {
            id: row.id,
            platform: row.platform,
            external_post_id: row.external_post_id,
            author_username: row.author_username,
            content: row.content,
            url: row.url,
            follower_count: row.follower_count,
            engagement_rate: row.engagement_rate,
            matched_terms: row.matched_terms,
            posted_at: row.posted_at,
            detected_at: row.detected_at,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
struct IngestSummary {
    evaluated: usize,
    matched: usize,
    inserted: usize,
}

fn view(row: BrandMonitorRow) -> Result<MonitorView, FunctionError> {
    MonitorView::try_from(row).map_err(|e| FunctionError::database(&e))
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub(super) async fn dispatch(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Response, FunctionError> {
    let action: BrandMonitorAction = parse_action(json_body(payload)?)?;
    let owner = caller.require()?.id;
    let pool = &state.pool;
    let db_err = |e: reach_db::DbError| FunctionError::database(&e);

    match action {
        BrandMonitorAction::CreateMonitor(p) => {
            let rule = prepare_rule(p.rule);
            let name = validate_monitor(&p.name, &rule)?;
            let fields = MonitorFields {
                name,
                rule: &rule,
                is_active: p.is_active.unwrap_or(true),
            };
            let row = reach_db::create_monitor(pool, owner, &fields)
                .await
                .map_err(db_err)?;
            tracing::info!(monitor_id = %row.public_id, %owner, "brand monitor created");
            Ok(success(view(row)?).into_response())
        }
        BrandMonitorAction::UpdateMonitor(p) => {
            let current = reach_db::get_monitor(pool, owner, p.monitor_id)
                .await
                .map_err(db_err)?
                .ok_or_else(monitor_not_found)?;
            let mut rule = current.rule().map_err(db_err)?;
            if let Some(keywords) = p.keywords {
                rule.keywords = keywords;
            }
            if let Some(hashtags) = p.hashtags {
                rule.hashtags = hashtags;
            }
            if let Some(platforms) = p.platforms {
                rule.platforms = platforms;
            }
            if p.min_followers.is_some() {
                rule.min_followers = p.min_followers;
            }
            if p.min_engagement_rate.is_some() {
                rule.min_engagement_rate = p.min_engagement_rate;
            }
            let rule = prepare_rule(rule);
            let name = p.name.unwrap_or(current.name);
            let name = validate_monitor(&name, &rule)?;
            let fields = MonitorFields {
                name,
                rule: &rule,
                is_active: p.is_active.unwrap_or(current.is_active),
            };
            let row = reach_db::update_monitor(pool, owner, p.monitor_id, &fields)
                .await
                .map_err(db_err)?
                .ok_or_else(monitor_not_found)?;
            Ok(success(view(row)?).into_response())
        }
        BrandMonitorAction::ListMonitors {} => {
            let rows = reach_db::list_monitors(pool, owner).await.map_err(db_err)?;
            let views = rows.into_iter().map(view).collect::<Result<Vec<_>, _>>()?;
            Ok(success(views).into_response())
        }
        BrandMonitorAction::DeleteMonitor(p) => {
            let deleted = reach_db::delete_monitor(pool, owner, p.monitor_id)
                .await
                .map_err(db_err)?;
            if !deleted {
                return Err(monitor_not_found());
            }
            Ok(success(json!({ "deleted": true })).into_response())
        }
        BrandMonitorAction::ListHits(p) => {
            let monitor = reach_db::get_monitor(pool, owner, p.monitor_id)
                .await
                .map_err(db_err)?
                .ok_or_else(monitor_not_found)?;
            let hits = reach_db::list_monitor_hits(pool, monitor.id, normalize_limit(p.limit))
                .await
                .map_err(db_err)?;
            Ok(success(hits.into_iter().map(HitView::from).collect::<Vec<_>>()).into_response())
        }
        BrandMonitorAction::IngestPosts(p) => {
            let summary = ingest_posts(&state, owner, p.posts).await?;
            tracing::info!(
                %owner,
                evaluated = summary.evaluated,
                matched = summary.matched,
                inserted = summary.inserted,
                "posts ingested"
            );
            Ok(success(summary).into_response())
        }
    }
}

fn monitor_not_found() -> FunctionError {
    FunctionError::not_found("Monitor not found")
}

/// Normalizes terms and coerces a percentage engagement threshold to a
/// fraction.
fn prepare_rule(rule: MonitorRule) -> MonitorRule {
    let mut rule = rule.normalized();
    rule.min_engagement_rate = rule.min_engagement_rate.map(engagement_fraction);
    rule
}

fn validate_monitor<'a>(name: &'a str, rule: &MonitorRule) -> Result<&'a str, FunctionError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FunctionError::bad_request("name is required"));
    }
    if !rule.has_terms() {
        return Err(FunctionError::bad_request(
            "at least one keyword or hashtag is required",
        ));
    }
    Ok(name)
}

async fn ingest_posts(
    state: &AppState,
    owner: Uuid,
    mut posts: Vec<ObservedPost>,
) -> Result<IngestSummary, FunctionError> {
    for post in &mut posts {
        post.engagement_rate = post.engagement_rate.map(engagement_fraction);
    }
    let monitors = reach_db::list_active_monitors(&state.pool, owner)
        .await
        .map_err(|e| FunctionError::database(&e))?;

    let mut summary = IngestSummary {
        evaluated: posts.len(),
        ..IngestSummary::default()
    };
    for monitor in &monitors {
        let rule = match monitor.rule() {
            Ok(rule) => rule,
            Err(e) => {
                tracing::warn!(monitor_id = %monitor.public_id, error = %e, "skipping monitor");
                continue;
            }
        };
        for post in &posts {
            let Some(terms) = match_post(&rule, post) else {
                continue;
            };
            summary.matched += 1;
            let hit = NewMonitorHit {
                post,
                matched_terms: &terms,
            };
            if reach_db::insert_monitor_hit(&state.pool, monitor.id, &hit)
                .await
                .map_err(|e| FunctionError::database(&e))?
            {
                summary.inserted += 1;
            }
        }
    }
    Ok(summary)
}
