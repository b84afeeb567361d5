use reqwest::Method;
use serde_json::{json, Value};

use super::{build_analytics, check_api_error, TikTokAnalytics, TikTokClient};
use crate::error::ProviderError;

const USER_FIELDS: &str = "open_id,union_id,avatar_url,display_name,bio_description,\
profile_deep_link,is_verified,username,follower_count,following_count,likes_count,video_count";
const VIDEO_FIELDS: &str = "id,title,video_description,create_time,cover_image_url,share_url,\
view_count,like_count,comment_count,share_count";
const MAX_VIDEOS: u32 = 20;

impl TikTokClient {
    /// The connected user's Display API profile object.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Vendor`] on a non-2xx response or an error
    /// code in the body, or [`ProviderError::NotFound`] if no user is returned.
    pub async fn user_info(&self, access_token: &str) -> Result<Value, ProviderError> {
        let raw = self
            .http
            .request(Method::GET, "user/info/")?
            .bearer(access_token)
            .query(&[("fields", USER_FIELDS)])
            .send()
            .await?;
        check_api_error(&raw)?;
        raw.pointer("/data/user")
            .filter(|u| u.is_object())
            .cloned()
            .ok_or_else(|| ProviderError::NotFound {
                platform: "tiktok".to_string(),
            })
    }

    /// The connected user's most recent videos (up to 20).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Vendor`] on a non-2xx response or an error
    /// code in the body.
    pub async fn list_videos(&self, access_token: &str) -> Result<Vec<Value>, ProviderError> {
        let raw = self
            .http
            .request(Method::POST, "video/list/")?
            .bearer(access_token)
            .query(&[("fields", VIDEO_FIELDS)])
            .json(&json!({ "max_count": MAX_VIDEOS }))
            .send()
            .await?;
        check_api_error(&raw)?;
        Ok(raw
            .pointer("/data/videos")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    /// Profile, derived metrics and recent videos for the connected user.
    ///
    /// # Errors
    ///
    /// See [`TikTokClient::user_info`] and [`TikTokClient::list_videos`].
    pub async fn profile_analytics(
        &self,
        access_token: &str,
    ) -> Result<TikTokAnalytics, ProviderError> {
        let (user, videos) = futures::try_join!(
            self.user_info(access_token),
            self.list_videos(access_token)
        )?;
        Ok(build_analytics(&user, &videos))
    }
}
