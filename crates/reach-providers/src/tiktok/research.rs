use reqwest::Method;
use serde_json::json;

use super::{build_analytics, check_api_error, TikTokAnalytics, TikTokClient};
use crate::error::ProviderError;

const RESEARCH_USER_FIELDS: &str = "display_name,bio_description,avatar_url,is_verified,\
follower_count,following_count,likes_count,video_count";

impl TikTokClient {
    /// Public profile stats for any `username`, via the Research API.
    ///
    /// Uses a client-credentials token; no user connection is required.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::InvalidRequest`] for a blank username.
    /// - [`ProviderError::NotFound`] if the API returns no user data.
    /// - [`ProviderError::Vendor`] on a non-2xx response or body error code.
    pub async fn research_user(&self, username: &str) -> Result<TikTokAnalytics, ProviderError> {
        let handle = username.trim().trim_start_matches('@');
        if handle.is_empty() {
            return Err(ProviderError::InvalidRequest(
                "username is required".to_string(),
            ));
        }

        let token = self.client_token().await?;
        let raw = self
            .http
            .request(Method::POST, "research/user/info/")?
            .bearer(&token.access_token)
            .query(&[("fields", RESEARCH_USER_FIELDS)])
            .json(&json!({ "username": handle }))
            .send()
            .await?;
        check_api_error(&raw)?;

        let mut user = raw
            .get("data")
            .filter(|d| d.as_object().is_some_and(|o| !o.is_empty()))
            .cloned()
            .ok_or_else(|| ProviderError::NotFound {
                platform: "tiktok".to_string(),
            })?;
        if user.get("username").is_none() {
            user["username"] = json!(handle);
        }
        Ok(build_analytics(&user, &[]))
    }
}
