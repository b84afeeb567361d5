//! Integration tests for `TikTokClient` using wiremock HTTP mocks.

use reach_core::ProviderConfig;
use reach_providers::{ProviderError, TikTokClient};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> TikTokClient {
    let config = ProviderConfig {
        tiktok_client_key: Some("ck".to_string()),
        tiktok_client_secret: Some("cs".to_string()),
        tiktok_redirect_uri: Some("https://app.example/tiktok/callback".to_string()),
        tiktok_base_url: base_url.to_string(),
        ..ProviderConfig::default()
    };
    TikTokClient::new(&config).expect("client construction should not fail")
}

#[test]
fn authorize_url_carries_client_key_scope_and_state() {
    let client = test_client("https://open.tiktokapis.com/v2/");
    let auth = client.authorize_url(None).expect("authorize url");
    assert!(auth.url.starts_with("https://www.tiktok.com/v2/auth/authorize/"));
    assert!(auth.url.contains("client_key=ck"));
    assert!(auth.url.contains("response_type=code"));
    assert!(auth.url.contains(&format!("state={}", auth.state)));
}

#[tokio::test]
async fn exchange_code_posts_form_and_parses_grant() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token/"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "act.1",
            "refresh_token": "rft.1",
            "open_id": "open-1",
            "expires_in": 86_400,
            "refresh_expires_in": 31_536_000,
            "scope": "user.info.basic",
            "token_type": "Bearer"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let grant = client
        .exchange_code("auth-code", None)
        .await
        .expect("token grant");
    assert_eq!(grant.access_token, "act.1");
    assert_eq!(grant.open_id, "open-1");
    assert_eq!(grant.refresh_token.as_deref(), Some("rft.1"));
}

#[tokio::test]
async fn exchange_code_error_body_is_vendor_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Authorization code is expired."
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.exchange_code("stale", None).await.unwrap_err();
    assert!(matches!(err, ProviderError::Vendor { status: 400, .. }));
}

#[tokio::test]
async fn profile_analytics_combines_user_and_videos() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user/info/"))
        .and(header("authorization", "Bearer act.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"user": {
                "open_id": "open-1",
                "username": "dancer",
                "follower_count": 1_000,
                "likes_count": 2_000,
                "video_count": 20,
                "is_verified": false
            }},
            "error": {"code": "ok", "message": ""}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/video/list/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"videos": [
                {"id": "v1", "view_count": 300},
                {"id": "v2", "view_count": 100}
            ], "has_more": false},
            "error": {"code": "ok"}
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let analytics = client.profile_analytics("act.1").await.expect("analytics");
    assert_eq!(analytics.profile.external_user_id, "open-1");
    assert_eq!(analytics.videos.len(), 2);
    // 2 000 / (1 000 * 20) * 100 = 10 %.
    assert!((analytics.metrics.engagement_rate - 10.0).abs() < 1e-9);
    assert!((analytics.metrics.avg_views - 200.0).abs() < 1e-9);
}

#[tokio::test]
async fn expired_token_maps_to_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user/info/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {"code": "access_token_invalid", "message": "The access token is invalid"}
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.user_info("expired").await.unwrap_err();
    assert_eq!(err.status_code(), 401);
}

#[tokio::test]
async fn research_user_uses_client_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token/"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "clt.1",
            "expires_in": 7_200
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/research/user/info/"))
        .and(header("authorization", "Bearer clt.1"))
        .and(query_param(
            "fields",
            "display_name,bio_description,avatar_url,is_verified,follower_count,following_count,likes_count,video_count",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"display_name": "Acme", "follower_count": 3_000_000, "video_count": 10, "likes_count": 0},
            "error": {"code": "ok"}
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let analytics = client.research_user("@acme").await.expect("research");
    assert_eq!(analytics.profile.username, "acme");
    assert_eq!(analytics.profile.follower_count, 3_000_000);
    assert_eq!(analytics.profile.tier().label(), "Celebrity");
}
