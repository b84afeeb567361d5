//! `ayrshare-tiktok`: TikTok analytics and publishing through a linked
//! Ayrshare profile.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use reach_providers::ayrshare::{HistoryQuery, SchedulePost};
use serde::Deserialize;
use serde_json::Value;

use crate::middleware::Caller;

use super::{
    json_body, parse_action, persist_profiles, resolve_profile_key, success, ActionSet, AppState,
    FunctionError,
};

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(super) enum AyrshareTikTokAction {
    GetAnalytics(Keyed<Empty>),
    GetHistory(Keyed<HistoryQuery>),
    GetComments(Keyed<CommentsQuery>),
    SchedulePost(Keyed<SchedulePost>),
}

impl ActionSet for AyrshareTikTokAction {
    const NAMES: &'static [&'static str] =
        &["get_analytics", "get_history", "get_comments", "schedule_post"];
}

/// An action payload plus the optional profile key it applies to.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Keyed<T> {
    profile_key: Option<String>,
    #[serde(flatten)]
    payload: T,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct Empty {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CommentsQuery {
    post_id: String,
}

pub(super) async fn dispatch(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, FunctionError> {
    let action: AyrshareTikTokAction = parse_action(json_body(payload)?)?;

    match action {
        AyrshareTikTokAction::GetAnalytics(req) => {
            let key = resolve_profile_key(&state, &caller, req.profile_key).await?;
            let snapshot = state.providers.ayrshare()?.tiktok_analytics(&key).await?;
            persist_profiles(&state.pool, [&snapshot.profile]).await;
            Ok(success(snapshot).into_response())
        }
        AyrshareTikTokAction::GetHistory(req) => {
            let key = resolve_profile_key(&state, &caller, req.profile_key).await?;
            let posts = state
                .providers
                .ayrshare()?
                .tiktok_history(&key, &req.payload)
                .await?;
            Ok(success(posts).into_response())
        }
        AyrshareTikTokAction::GetComments(req) => {
            let key = resolve_profile_key(&state, &caller, req.profile_key).await?;
            let comments = state
                .providers
                .ayrshare()?
                .tiktok_comments(&key, &req.payload.post_id)
                .await?;
            Ok(success(comments).into_response())
        }
        AyrshareTikTokAction::SchedulePost(req) => {
            // Reject an invalid post before touching credentials or the vendor.
            req.payload.validate(chrono::Utc::now())?;
            let key = resolve_profile_key(&state, &caller, req.profile_key).await?;
            let scheduled = state
                .providers
                .ayrshare()?
                .schedule_tiktok_post(&key, &req.payload)
                .await?;
            Ok(success(scheduled).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use reach_core::ProviderConfig;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::api::test_support::{app_with, post_json};

    fn config(base_url: &str) -> ProviderConfig {
        ProviderConfig {
            ayrshare_api_key: Some("biz-key".to_string()),
            ayrshare_base_url: base_url.to_string(),
            ..ProviderConfig::default()
        }
    }

    #[tokio::test]
    async fn schedule_post_without_video_is_rejected_before_vendor() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (status, body) = post_json(
            app_with(&config(&server.uri())),
            "/functions/v1/ayrshare-tiktok",
            json!({"action": "schedule_post", "profileKey": "pk-1", "post": "hello"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("video"));
    }

    #[tokio::test]
    async fn history_passes_profile_key_and_window() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history/tiktok"))
            .and(header("Profile-Key", "pk-1"))
            .and(query_param("lastDays", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "v1", "post": "first", "analytics": {"videoViews": 900, "likes": 40}}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let (status, body) = post_json(
            app_with(&config(&server.uri())),
            "/functions/v1/ayrshare-tiktok",
            json!({"action": "get_history", "profileKey": "pk-1", "lastDays": 7}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["views"], 900);
    }

    #[tokio::test]
    async fn analytics_without_tiktok_section_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analytics/social"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
            .mount(&server)
            .await;

        let (status, body) = post_json(
            app_with(&config(&server.uri())),
            "/functions/v1/ayrshare-tiktok",
            json!({"action": "get_analytics", "profileKey": "pk-1"}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["user_help"].as_str().unwrap().contains("tiktok"));
    }
}
