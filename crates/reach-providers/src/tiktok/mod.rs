//! TikTok Login Kit, Display API and Research API.

mod display;
mod normalize;
mod oauth;
mod research;

pub use normalize::{build_analytics, TikTokAdapter, TikTokAnalytics, VideoStats};
pub use oauth::{AuthorizeUrl, ClientToken, TokenGrant, DISPLAY_SCOPES};

use reach_core::ProviderConfig;
use serde_json::Value;

use crate::error::ProviderError;
use crate::http::{Provider, VendorClient};

pub struct TikTokClient {
    http: VendorClient,
    client_key: String,
    client_secret: String,
    redirect_uri: Option<String>,
    auth_url: String,
}

impl TikTokClient {
    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] when the client key or secret
    /// is unset, or an HTTP/URL error if the client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client_key = config
            .tiktok_client_key
            .clone()
            .ok_or(ProviderError::NotConfigured {
                provider: Provider::TikTok,
                setting: "TIKTOK_CLIENT_KEY",
            })?;
        let client_secret =
            config
                .tiktok_client_secret
                .clone()
                .ok_or(ProviderError::NotConfigured {
                    provider: Provider::TikTok,
                    setting: "TIKTOK_CLIENT_SECRET",
                })?;
        // Every call carries a per-user or client token, so no default bearer.
        let http = VendorClient::new(
            Provider::TikTok,
            &config.tiktok_base_url,
            None,
            config.request_timeout_secs,
            &config.user_agent,
        )?;
        Ok(Self {
            http,
            client_key,
            client_secret,
            redirect_uri: config.tiktok_redirect_uri.clone(),
            auth_url: config.tiktok_auth_url.clone(),
        })
    }
}

/// TikTok reports API failures inside a 200 body as
/// `{"error": {"code": "...", "message": "..."}}`; anything but `"ok"` is
/// surfaced as a vendor error.
fn check_api_error(raw: &Value) -> Result<(), ProviderError> {
    let Some(error) = raw.get("error").filter(|e| e.is_object()) else {
        return Ok(());
    };
    let code = error.get("code").and_then(Value::as_str).unwrap_or("ok");
    if code == "ok" {
        return Ok(());
    }
    let status = match code {
        "access_token_invalid" | "scope_not_authorized" | "scope_permission_missed" => 401,
        "rate_limit_exceeded" => 429,
        "invalid_params" => 400,
        _ => 500,
    };
    Err(ProviderError::Vendor {
        provider: Provider::TikTok,
        status,
        body: raw.to_string(),
    })
}
