//! Identity provider (Supabase Auth) client: resolves a session token into
//! the authenticated user.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProviderError;
use crate::http::{Provider, VendorClient};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

pub struct IdentityClient {
    http: VendorClient,
    anon_key: String,
}

impl IdentityClient {
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the HTTP client cannot be built or the URL
    /// is invalid.
    pub fn new(
        supabase_url: &str,
        anon_key: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ProviderError> {
        let base = format!("{}/auth/v1/", supabase_url.trim_end_matches('/'));
        Ok(Self {
            http: VendorClient::new(Provider::Identity, &base, None, timeout_secs, user_agent)?,
            anon_key: anon_key.to_string(),
        })
    }

    /// Returns the user that owns `access_token`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Vendor`] with status 401 for an invalid or
    /// expired token, or [`ProviderError::Deserialize`] if the user payload
    /// has no usable `id`.
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser, ProviderError> {
        let raw = self
            .http
            .request(Method::GET, "user")?
            .bearer(access_token)
            .header("apikey", &self.anon_key)
            .send()
            .await?;
        serde_json::from_value(raw).map_err(|e| ProviderError::Deserialize {
            context: "identity user".to_string(),
            source: e,
        })
    }
}
