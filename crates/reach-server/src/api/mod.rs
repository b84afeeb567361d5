mod ayrshare_auth;
mod ayrshare_tiktok;
mod brand_lookup;
mod brand_monitor;
mod modash;
mod tiktok;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::TimeDelta;
use reach_core::CreatorProfile;
use reach_providers::{Provider, ProviderError, ProviderSet};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, resolve_caller, Caller, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub providers: Arc<ProviderSet>,
    pub dictionary_ttl: TimeDelta,
}

// ---------------------------------------------------------------------------
// Response envelopes
// ---------------------------------------------------------------------------

/// `{success: true, data}` body returned by action endpoints.
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
    pub success: bool,
    pub data: T,
}

pub(super) fn success<T: Serialize>(data: T) -> Json<Success<T>> {
    Json(Success {
        success: true,
        data,
    })
}

/// `{success: false, error, user_help?}` with the HTTP status of its category.
#[derive(Debug)]
pub struct FunctionError {
    status: StatusCode,
    error: String,
    user_help: Option<String>,
}

#[derive(Serialize)]
struct FunctionErrorBody<'a> {
    success: bool,
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_help: Option<&'a str>,
}

impl FunctionError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            user_help: None,
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn unauthorized(error: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error)
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.user_help = Some(help.into());
        self
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub(super) fn unknown_action(action: &str) -> Self {
        Self::bad_request(format!("Unknown action: {action}"))
    }

    /// Logs a database failure and hides its detail from the caller.
    pub(super) fn database(error: &reach_db::DbError) -> Self {
        tracing::error!(error = %error, "database query failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl From<ProviderError> for FunctionError {
    fn from(err: ProviderError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::warn!(error = %err, "provider call failed");
        } else {
            tracing::debug!(error = %err, "provider call rejected");
        }
        Self {
            status,
            user_help: err.user_help(),
            error: err.to_string(),
        }
    }
}

impl IntoResponse for FunctionError {
    fn into_response(self) -> Response {
        let body = FunctionErrorBody {
            success: false,
            error: &self.error,
            user_help: self.user_help.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Action dispatch
// ---------------------------------------------------------------------------

/// A closed set of actions accepted by one function endpoint, deserialized
/// from `{"action": "<name>", ...payload}`.
pub(super) trait ActionSet: DeserializeOwned {
    const NAMES: &'static [&'static str];
}

/// Unwraps the JSON body, turning extractor rejections into the function
/// error envelope.
pub(super) fn json_body(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Value, FunctionError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| FunctionError::bad_request(format!("Invalid JSON body: {}", e.body_text())))
}

/// Deserializes a payload without an `action` field.
pub(super) fn parse_payload<T: DeserializeOwned>(body: Value) -> Result<T, FunctionError> {
    serde_json::from_value(body)
        .map_err(|e| FunctionError::bad_request(format!("Invalid payload: {e}")))
}

/// Checks `action` against `A::NAMES` before deserializing, so an unknown
/// action never reaches a handler.
pub(super) fn parse_action<A: ActionSet>(body: Value) -> Result<A, FunctionError> {
    let action = match body.get("action") {
        Some(Value::String(action)) => action.as_str(),
        Some(other) => return Err(FunctionError::unknown_action(&other.to_string())),
        None => return Err(FunctionError::bad_request("Missing action")),
    };
    if !A::NAMES.contains(&action) {
        return Err(FunctionError::unknown_action(action));
    }
    let action = action.to_string();
    serde_json::from_value(body)
        .map_err(|e| FunctionError::bad_request(format!("Invalid payload for {action}: {e}")))
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

/// The Ayrshare profile key to act on: the one in the payload, else the
/// caller's stored credential.
pub(super) async fn resolve_profile_key(
    state: &AppState,
    caller: &Caller,
    explicit: Option<String>,
) -> Result<String, FunctionError> {
    if let Some(key) = explicit.filter(|k| !k.trim().is_empty()) {
        return Ok(key);
    }
    let user = caller.require()?;
    let stored = reach_db::get_credential(
        &state.pool,
        user.id,
        reach_db::CredentialProvider::Ayrshare,
    )
    .await
    .map_err(|e| FunctionError::database(&e))?;

    stored
        .and_then(|c| c.profile_key)
        .ok_or_else(|| {
            ProviderError::NotConnected {
                provider: Provider::Ayrshare,
            }
            .into()
        })
}

/// Stores fetched profiles; a failed write is logged and does not fail the
/// request.
pub(super) async fn persist_profiles<'a>(
    pool: &PgPool,
    profiles: impl IntoIterator<Item = &'a CreatorProfile>,
) {
    for profile in profiles {
        if profile.external_user_id.is_empty() {
            continue;
        }
        if let Err(e) = reach_db::upsert_creator_profile(pool, profile).await {
            tracing::warn!(
                error = %e,
                platform = %profile.platform,
                username = %profile.username,
                "failed to persist creator profile"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("apikey"),
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("x-request-id"),
        ])
}

fn functions_router(state: &AppState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/functions/v1/ayrshare-auth",
            post(ayrshare_auth::dispatch),
        )
        .route(
            "/functions/v1/ayrshare-tiktok",
            post(ayrshare_tiktok::dispatch),
        )
        .route(
            "/functions/v1/ayrshare-brand-lookup",
            post(brand_lookup::lookup),
        )
        .route("/functions/v1/tiktok", post(tiktok::dispatch))
        .route(
            "/functions/v1/brand-monitor",
            post(brand_monitor::dispatch),
        )
        .route("/functions/v1/modash-search", post(modash::search))
        .route(
            "/functions/v1/modash-dictionaries",
            post(modash::dictionaries),
        )
        .route(
            "/functions/v1/modash-status",
            get(modash::status).post(modash::status),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    Arc::clone(&state.providers),
                    resolve_caller,
                )),
        )
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(functions_router(&state, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http())
                .layer(build_cors()),
        )
        .with_state(state)
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    match reach_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            success(HealthData {
                status: "ok",
                database: "ok",
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, request_id = %req_id.0, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                success(HealthData {
                    status: "degraded",
                    database: "unavailable",
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}


#[cfg(test)]
mod tests {
    use super::test_support::{app_with, post_json};
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use reach_core::ProviderConfig;
    use serde::Deserialize;
    use serde_json::json;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(tag = "action", rename_all = "snake_case")]
    enum PingActions {
        Ping { n: u32 },
        Pong {},
    }

    impl ActionSet for PingActions {
        const NAMES: &'static [&'static str] = &["ping", "pong"];
    }

    #[test]
    fn parse_action_rejects_unknown_and_missing_actions() {
        let err = parse_action::<PingActions>(json!({"action": "pang"})).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error, "Unknown action: pang");

        let err = parse_action::<PingActions>(json!({"n": 1})).unwrap_err();
        assert_eq!(err.error, "Missing action");

        let err = parse_action::<PingActions>(json!({"action": 7})).unwrap_err();
        assert!(err.error.starts_with("Unknown action"));
    }

    #[test]
    fn parse_action_reports_bad_payload_for_known_action() {
        let err = parse_action::<PingActions>(json!({"action": "ping", "n": "x"})).unwrap_err();
        assert!(err.error.starts_with("Invalid payload for ping"));

        let ok = parse_action::<PingActions>(json!({"action": "pong", "extra": true})).unwrap();
        assert_eq!(ok, PingActions::Pong {});
    }

    #[test]
    fn normalize_limit_applies_defaults_and_bounds() {
        assert_eq!(normalize_limit(None), 50);
        assert_eq!(normalize_limit(Some(0)), 1);
        assert_eq!(normalize_limit(Some(1_000)), 200);
        assert_eq!(normalize_limit(Some(25)), 25);
    }

    #[test]
    fn provider_errors_keep_status_and_help() {
        let err = FunctionError::from(ProviderError::NotConnected {
            provider: Provider::TikTok,
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.user_help.as_deref().unwrap().contains("not connected"));

        let err = FunctionError::from(ProviderError::Vendor {
            provider: Provider::Modash,
            status: 503,
            body: "maintenance".to_string(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.error.contains("maintenance"));
    }

    #[tokio::test]
    async fn preflight_allows_any_origin() {
        let app = app_with(&ProviderConfig::default());
        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/functions/v1/modash-search")
                    .header("origin", "https://app.example")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert!(response.status().is_success());
        let headers = response.headers();
        assert_eq!(
            headers
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
        let methods = headers
            .get("access-control-allow-methods")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(methods.contains("POST"));
        assert!(methods.contains("OPTIONS"));
    }

    #[tokio::test]
    async fn every_response_carries_a_request_id() {
        let app = app_with(&ProviderConfig::default());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/functions/v1/modash-status")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(
            response
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok()),
            Some("req-42")
        );
    }

    #[tokio::test]
    async fn health_reports_degraded_without_database() {
        let app = app_with(&ProviderConfig::default());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn malformed_json_body_is_bad_request_envelope() {
        let app = app_with(&ProviderConfig::default());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/functions/v1/tiktok")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_action_is_rejected_on_every_dispatcher() {
        for endpoint in ["ayrshare-auth", "ayrshare-tiktok", "tiktok", "brand-monitor"] {
            let app = app_with(&ProviderConfig::default());
            let (status, body) = post_json(
                app,
                &format!("/functions/v1/{endpoint}"),
                json!({"action": "drop_tables"}),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{endpoint}");
            assert_eq!(body["success"], false);
            assert_eq!(body["error"], "Unknown action: drop_tables");
        }
    }

    #[tokio::test]
    async fn rate_limit_returns_429_envelope() {
        let providers = ProviderSet::from_config(&ProviderConfig::default()).expect("providers");
        let app = build_app(
            AppState {
                pool: test_support::unreachable_pool(),
                providers: Arc::new(providers),
                dictionary_ttl: TimeDelta::hours(24),
            },
            RateLimitState::new(1, Duration::from_secs(60)),
        );

        let (first, _) = post_json(app.clone(), "/functions/v1/modash-status", json!({})).await;
        assert_eq!(first, StatusCode::OK);
        let (second, body) = post_json(app, "/functions/v1/modash-status", json!({})).await;
        assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["success"], false);
    }
}
