use chrono::{DateTime, TimeDelta, Utc};
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{check_api_error, TikTokClient};
use crate::error::ProviderError;
use crate::http::Provider;

/// Scopes requested for the Display API connection.
pub const DISPLAY_SCOPES: &str = "user.info.basic,user.info.profile,user.info.stats,video.list";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorizeUrl {
    pub url: String,
    pub state: String,
}

/// Tokens returned by the authorization-code exchange.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub open_id: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenGrant {
    /// Absolute access-token expiry relative to `issued_at`.
    #[must_use]
    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.expires_in
            .and_then(TimeDelta::try_seconds)
            .map(|ttl| issued_at + ttl)
    }
}

/// App-level token for the Research API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// 32 random bytes, hex-encoded, for the OAuth `state` parameter.
fn random_state() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

/// TikTok's token endpoint answers failures with 200 and
/// `{"error": "...", "error_description": "..."}`.
fn check_oauth_error(raw: &Value) -> Result<(), ProviderError> {
    match raw.get("error").and_then(Value::as_str) {
        Some(code) if !code.is_empty() => Err(ProviderError::Vendor {
            provider: Provider::TikTok,
            status: if code == "invalid_client" { 401 } else { 400 },
            body: raw.to_string(),
        }),
        _ => Ok(()),
    }
}

impl TikTokClient {
    fn redirect_uri<'a>(&'a self, override_uri: Option<&'a str>) -> Result<&'a str, ProviderError> {
        override_uri
            .or(self.redirect_uri.as_deref())
            .ok_or(ProviderError::NotConfigured {
                provider: Provider::TikTok,
                setting: "TIKTOK_REDIRECT_URI",
            })
    }

    /// Builds the Login Kit authorization URL with a fresh `state`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] without a redirect URI, or
    /// [`ProviderError::InvalidUrl`] if the authorization URL is invalid.
    pub fn authorize_url(&self, redirect_uri: Option<&str>) -> Result<AuthorizeUrl, ProviderError> {
        let redirect_uri = self.redirect_uri(redirect_uri)?;
        let state = random_state();
        let url = Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_key", self.client_key.as_str()),
                ("scope", DISPLAY_SCOPES),
                ("response_type", "code"),
                ("redirect_uri", redirect_uri),
                ("state", state.as_str()),
            ],
        )
        .map_err(|e| ProviderError::InvalidUrl {
            url: self.auth_url.clone(),
            reason: e.to_string(),
        })?;
        Ok(AuthorizeUrl {
            url: url.to_string(),
            state,
        })
    }

    /// Exchanges an authorization code for user tokens.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::InvalidRequest`] for a blank code.
    /// - [`ProviderError::Vendor`] when TikTok rejects the code.
    /// - [`ProviderError::Deserialize`] if the grant is missing fields.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
    ) -> Result<TokenGrant, ProviderError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ProviderError::InvalidRequest("code is required".to_string()));
        }
        let redirect_uri = self.redirect_uri(redirect_uri)?;
        let raw = self
            .http
            .request(Method::POST, "oauth/token/")?
            .form(&[
                ("client_key", self.client_key.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await?;
        check_oauth_error(&raw)?;
        serde_json::from_value(raw).map_err(|e| ProviderError::Deserialize {
            context: "tiktok oauth/token (authorization_code)".to_string(),
            source: e,
        })
    }

    /// Obtains an app token via the client-credentials grant.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Vendor`] when TikTok rejects the client.
    pub async fn client_token(&self) -> Result<ClientToken, ProviderError> {
        let raw = self
            .http
            .request(Method::POST, "oauth/token/")?
            .form(&[
                ("client_key", self.client_key.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;
        check_oauth_error(&raw)?;
        serde_json::from_value(raw).map_err(|e| ProviderError::Deserialize {
            context: "tiktok oauth/token (client_credentials)".to_string(),
            source: e,
        })
    }

    /// Revokes a user access token.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Vendor`] on a non-2xx response.
    pub async fn revoke(&self, access_token: &str) -> Result<(), ProviderError> {
        let raw = self
            .http
            .request(Method::POST, "oauth/revoke/")?
            .form(&[
                ("client_key", self.client_key.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("token", access_token),
            ])
            .send()
            .await?;
        check_oauth_error(&raw)?;
        check_api_error(&raw)
    }
}
