//! `tiktok`: Login Kit connection, Display API analytics for the connected
//! account, and Research API lookups for any public creator.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, TimeDelta, Utc};
use reach_db::{CredentialProvider, NewCredential};
use reach_providers::{Provider, ProviderError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::middleware::Caller;

use super::{
    json_body, parse_action, persist_profiles, success, ActionSet, AppState, FunctionError,
};

/// How long an issued OAuth `state` stays redeemable.
const OAUTH_STATE_TTL_MINUTES: i64 = 15;

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(super) enum TikTokAction {
    GetAuthUrl(RedirectPayload),
    ExchangeCode(ExchangePayload),
    GetProfile {},
    ResearchUser(ResearchPayload),
    Disconnect {},
}

impl ActionSet for TikTokAction {
    const NAMES: &'static [&'static str] = &[
        "get_auth_url",
        "exchange_code",
        "get_profile",
        "research_user",
        "disconnect",
    ];
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RedirectPayload {
    redirect_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ExchangePayload {
    code: String,
    /// The `state` echoed back on the redirect; must match one issued by
    /// `get_auth_url` to the same caller.
    state: String,
    redirect_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ResearchPayload {
    username: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Connection {
    connected: bool,
    open_id: String,
    expires_at: Option<DateTime<Utc>>,
    scope: Option<String>,
}

pub(super) async fn dispatch(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, FunctionError> {
    let action: TikTokAction = parse_action(json_body(payload)?)?;

    match action {
        TikTokAction::GetAuthUrl(p) => get_auth_url(&state, &caller, p).await,
        TikTokAction::ExchangeCode(p) => exchange_code(&state, &caller, p).await,
        TikTokAction::GetProfile {} => get_profile(&state, &caller).await,
        TikTokAction::ResearchUser(p) => {
            let analytics = state.providers.tiktok()?.research_user(&p.username).await?;
            persist_profiles(&state.pool, [&analytics.profile]).await;
            Ok(success(analytics).into_response())
        }
        TikTokAction::Disconnect {} => disconnect(&state, &caller).await,
    }
}

async fn get_auth_url(
    state: &AppState,
    caller: &Caller,
    payload: RedirectPayload,
) -> Result<Response, FunctionError> {
    let user = caller.require()?;
    let auth = state
        .providers
        .tiktok()?
        .authorize_url(payload.redirect_uri.as_deref())?;

    reach_db::save_oauth_state(
        &state.pool,
        user.id,
        CredentialProvider::TikTok,
        &auth.state,
        Utc::now() + TimeDelta::minutes(OAUTH_STATE_TTL_MINUTES),
    )
    .await
    .map_err(|e| FunctionError::database(&e))?;

    Ok(success(auth).into_response())
}

async fn exchange_code(
    state: &AppState,
    caller: &Caller,
    payload: ExchangePayload,
) -> Result<Response, FunctionError> {
    let user = caller.require()?;
    let oauth_state = payload.state.trim();
    if oauth_state.is_empty() {
        return Err(FunctionError::bad_request("state is required"));
    }
    let issued = reach_db::take_oauth_state(
        &state.pool,
        user.id,
        CredentialProvider::TikTok,
        oauth_state,
        Utc::now(),
    )
    .await
    .map_err(|e| FunctionError::database(&e))?;
    if !issued {
        tracing::warn!(user_id = %user.id, "tiktok oauth state mismatch");
        return Err(FunctionError::bad_request("Invalid or expired OAuth state")
            .with_help("Start the TikTok connection again from the beginning."));
    }

    let grant = state
        .providers
        .tiktok()?
        .exchange_code(&payload.code, payload.redirect_uri.as_deref())
        .await?;
    let expires_at = grant.expires_at(Utc::now());

    reach_db::upsert_credential(
        &state.pool,
        user.id,
        CredentialProvider::TikTok,
        &NewCredential {
            access_token: Some(&grant.access_token),
            refresh_token: grant.refresh_token.as_deref(),
            open_id: Some(&grant.open_id),
            expires_at,
            ..NewCredential::default()
        },
    )
    .await
    .map_err(|e| FunctionError::database(&e))?;

    tracing::info!(user_id = %user.id, open_id = %grant.open_id, "tiktok account connected");
    Ok(success(Connection {
        connected: true,
        open_id: grant.open_id,
        expires_at,
        scope: grant.scope,
    })
    .into_response())
}

/// Stored, unexpired TikTok access token for the caller.
async fn access_token(state: &AppState, caller: &Caller) -> Result<String, FunctionError> {
    let user = caller.require()?;
    let credential = reach_db::get_credential(&state.pool, user.id, CredentialProvider::TikTok)
        .await
        .map_err(|e| FunctionError::database(&e))?;

    let not_connected = || {
        FunctionError::from(ProviderError::NotConnected {
            provider: Provider::TikTok,
        })
    };
    let credential = credential.ok_or_else(not_connected)?;
    if credential.is_expired(Utc::now()) {
        return Err(FunctionError::unauthorized("TikTok access token expired")
            .with_help("Your TikTok connection has expired. Reconnect TikTok and try again."));
    }
    credential.access_token.ok_or_else(not_connected)
}

async fn get_profile(state: &AppState, caller: &Caller) -> Result<Response, FunctionError> {
    let token = access_token(state, caller).await?;
    let analytics = state.providers.tiktok()?.profile_analytics(&token).await?;
    persist_profiles(&state.pool, [&analytics.profile]).await;
    Ok(success(analytics).into_response())
}

async fn disconnect(state: &AppState, caller: &Caller) -> Result<Response, FunctionError> {
    let user = caller.require()?;
    let credential = reach_db::get_credential(&state.pool, user.id, CredentialProvider::TikTok)
        .await
        .map_err(|e| FunctionError::database(&e))?;

    let mut revoked = false;
    if let Some(token) = credential.and_then(|c| c.access_token) {
        match state.providers.tiktok()?.revoke(&token).await {
            Ok(()) => revoked = true,
            Err(e) => tracing::warn!(user_id = %user.id, error = %e, "tiktok token revoke failed"),
        }
    }

    let removed = reach_db::delete_credential(&state.pool, user.id, CredentialProvider::TikTok)
        .await
        .map_err(|e| FunctionError::database(&e))?;

    Ok(success(json!({ "disconnected": removed, "revoked": revoked })).into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use reach_core::ProviderConfig;
    use serde_json::json;
    use uuid::Uuid;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::api::test_support::{app_with, mount_identity, post_json, post_json_as};

    fn config(base_url: &str) -> ProviderConfig {
        ProviderConfig {
            tiktok_client_key: Some("client-key".to_string()),
            tiktok_client_secret: Some("client-secret".to_string()),
            tiktok_redirect_uri: Some("https://app.example/callback".to_string()),
            tiktok_base_url: base_url.to_string(),
            ..ProviderConfig::default()
        }
    }

    fn signed_in_config(server: &MockServer) -> ProviderConfig {
        ProviderConfig {
            supabase_url: Some(server.uri()),
            supabase_anon_key: Some("anon".to_string()),
            ..config(&server.uri())
        }
    }

    #[tokio::test]
    async fn auth_url_requires_session() {
        let server = MockServer::start().await;
        let (status, body) = post_json(
            app_with(&config(&server.uri())),
            "/functions/v1/tiktok",
            json!({"action": "get_auth_url"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn auth_url_is_withheld_when_state_cannot_be_saved() {
        let server = MockServer::start().await;
        mount_identity(&server, Uuid::new_v4()).await;

        let (status, body) = post_json_as(
            app_with(&signed_in_config(&server)),
            "/functions/v1/tiktok",
            "session-token",
            json!({"action": "get_auth_url"}),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn exchange_code_without_state_is_bad_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (status, body) = post_json(
            app_with(&config(&server.uri())),
            "/functions/v1/tiktok",
            json!({"action": "exchange_code", "code": "abc"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid payload for exchange_code"));
    }

    #[tokio::test]
    async fn exchange_code_with_blank_state_never_calls_vendor() {
        let server = MockServer::start().await;
        mount_identity(&server, Uuid::new_v4()).await;
        Mock::given(method("POST"))
            .and(path("/oauth/token/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (status, body) = post_json_as(
            app_with(&signed_in_config(&server)),
            "/functions/v1/tiktok",
            "session-token",
            json!({"action": "exchange_code", "code": "abc", "state": "  "}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "state is required");
    }

    #[tokio::test]
    async fn exchange_code_checks_state_before_redeeming_code() {
        let server = MockServer::start().await;
        mount_identity(&server, Uuid::new_v4()).await;
        Mock::given(method("POST"))
            .and(path("/oauth/token/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (status, _) = post_json_as(
            app_with(&signed_in_config(&server)),
            "/functions/v1/tiktok",
            "session-token",
            json!({"action": "exchange_code", "code": "abc", "state": "forged"}),
        )
        .await;
        // The state store is unreachable here, so the code is never redeemed.
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn research_user_returns_profile_and_metrics() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token/"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "app-token", "expires_in": 7200})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/research/user/info/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "display_name": "Acme",
                    "follower_count": 120_000,
                    "likes_count": 900_000,
                    "video_count": 300,
                    "is_verified": true
                },
                "error": {"code": "ok"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (status, body) = post_json(
            app_with(&config(&server.uri())),
            "/functions/v1/tiktok",
            json!({"action": "research_user", "username": "@acme"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["profile"]["username"], "acme");
        assert_eq!(body["data"]["profile"]["followerCount"], 120_000);
        assert!(body["data"]["metrics"]["influenceScore"].is_number());
    }

    #[tokio::test]
    async fn exchange_code_requires_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (status, _) = post_json(
            app_with(&config(&server.uri())),
            "/functions/v1/tiktok",
            json!({"action": "exchange_code", "code": "abc", "state": "s-1"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn research_user_blank_username_is_bad_request() {
        let server = MockServer::start().await;
        let (status, body) = post_json(
            app_with(&config(&server.uri())),
            "/functions/v1/tiktok",
            json!({"action": "research_user", "username": "  "}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }
}
