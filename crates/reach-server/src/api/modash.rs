//! Modash discovery endpoints: creator search, cached filter dictionaries and
//! account status.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use reach_core::{CacheSource, CachedLookup, DictionaryKey, DictionaryKind, LookupError, Platform};
use reach_db::{NewSearchLog, PgDictionaryStore};
use reach_providers::modash::{service_status, SearchRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::middleware::Caller;

use super::{json_body, parse_payload, AppState, FunctionError};

// ---------------------------------------------------------------------------
// modash-search
// ---------------------------------------------------------------------------

pub(super) async fn search(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, FunctionError> {
    let request: SearchRequest = parse_payload(json_body(payload)?)?;
    let response = state.providers.modash()?.search(&request).await?;

    let log = NewSearchLog {
        user_id: caller.user_id(),
        platform: response.meta.platform.as_str(),
        filters: &request.filters,
        result_count: i32::try_from(response.results.len()).unwrap_or(i32::MAX),
        estimated_credits: response.meta.estimated_credits,
        actual_credits: response.meta.actual_credits,
    };
    if let Err(e) = reach_db::insert_search_log(&state.pool, &log).await {
        tracing::warn!(error = %e, "failed to record search log");
    }

    tracing::info!(
        platform = %response.meta.platform,
        results = response.results.len(),
        lookalikes = response.lookalikes.len(),
        "modash search complete"
    );
    Ok(Json(response).into_response())
}

// ---------------------------------------------------------------------------
// modash-dictionaries
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct DictionaryPayload {
    kind: String,
    query: Option<String>,
    limit: Option<u32>,
    platform: Option<Platform>,
}

#[derive(Debug, Serialize)]
struct DictionaryItem {
    id: String,
    name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    entry_type: Option<String>,
}

pub(super) async fn dictionaries(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, FunctionError> {
    let payload: DictionaryPayload = parse_payload(json_body(payload)?)?;
    let kind: DictionaryKind = payload
        .kind
        .parse()
        .map_err(|e: reach_core::CoreError| FunctionError::bad_request(e.to_string()))?;
    let platform = payload.platform.unwrap_or(Platform::Instagram);
    if !platform.is_discoverable() {
        return Err(FunctionError::bad_request(format!(
            "dictionaries are not available for {platform}"
        )));
    }
    let key = DictionaryKey::new(platform, kind, payload.query.as_deref(), payload.limit);

    let cache = CachedLookup::new(PgDictionaryStore::new(state.pool.clone()), state.dictionary_ttl);
    let providers = &state.providers;
    let lookup = cache
        .get_or_fetch(&key, || async {
            providers.modash()?.fetch_dictionary(&key).await
        })
        .await
        .map_err(|e| match e {
            LookupError::Store(db) => FunctionError::database(&db),
            LookupError::Fetch(vendor) => {
                tracing::warn!(
                    platform = %key.platform,
                    kind = %key.kind,
                    error = %vendor,
                    "dictionary fetch failed"
                );
                FunctionError::new(StatusCode::INTERNAL_SERVER_ERROR, vendor.to_string())
            }
        })?;

    tracing::debug!(
        platform = %key.platform,
        kind = %key.kind,
        source = ?lookup.source,
        count = lookup.values.len(),
        "dictionary lookup"
    );

    let cache_header = match lookup.source {
        CacheSource::Hit => "hit",
        CacheSource::Miss => "miss",
    };
    let items: Vec<DictionaryItem> = lookup
        .values
        .into_iter()
        .map(|entry| DictionaryItem {
            id: entry.entry_id,
            name: entry.name,
            entry_type: entry.entry_type,
        })
        .collect();

    let mut response = Json(items).into_response();
    response
        .headers_mut()
        .insert("x-cache", HeaderValue::from_static(cache_header));
    Ok(response)
}

// ---------------------------------------------------------------------------
// modash-status
// ---------------------------------------------------------------------------

pub(super) async fn status(State(state): State<AppState>) -> Response {
    Json(service_status(state.providers.modash_if_configured()).await).into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use reach_core::ProviderConfig;
    use serde_json::json;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::api::test_support::{app_with, post_json};

    fn config(base_url: &str) -> ProviderConfig {
        ProviderConfig {
            modash_api_key: Some("modash-key".to_string()),
            modash_base_url: base_url.to_string(),
            ..ProviderConfig::default()
        }
    }

    #[tokio::test]
    async fn status_without_key_is_unconfigured_via_get() {
        let response = app_with(&ProviderConfig::default())
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/functions/v1/modash-status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["health"], "unconfigured");
        assert_eq!(body["degraded"], true);
    }

    #[tokio::test]
    async fn status_vendor_error_is_down_with_ok_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/info"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let (status, body) = post_json(
            app_with(&config(&server.uri())),
            "/functions/v1/modash-status",
            json!({}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["health"], "down");
    }

    #[tokio::test]
    async fn search_with_only_lookalikes_is_not_exact() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/instagram/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 1,
                "directs": [],
                "lookalikes": [{
                    "userId": "42",
                    "profile": {"username": "near_miss", "followers": 9_000, "engagementRate": 0.05}
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (status, body) = post_json(
            app_with(&config(&server.uri())),
            "/functions/v1/modash-search",
            json!({"platform": "instagram", "filters": {"influencer": {"followers": {"min": 1000}}}}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"], json!([]));
        assert_eq!(body["lookalikes"].as_array().unwrap().len(), 1);
        assert_eq!(body["meta"]["exactMatch"], false);
        assert_eq!(body["pageSize"], 15);
    }

    #[tokio::test]
    async fn search_on_facebook_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (status, _) = post_json(
            app_with(&config(&server.uri())),
            "/functions/v1/modash-search",
            json!({"platform": "facebook"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_dictionary_kind_is_bad_request() {
        let (status, body) = post_json(
            app_with(&config("http://127.0.0.1:1")),
            "/functions/v1/modash-dictionaries",
            json!({"kind": "hashtags"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn dictionary_store_failure_is_server_error() {
        let (status, body) = post_json(
            app_with(&config("http://127.0.0.1:1")),
            "/functions/v1/modash-dictionaries",
            json!({"kind": "locations", "query": "york"}),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
    }
}
