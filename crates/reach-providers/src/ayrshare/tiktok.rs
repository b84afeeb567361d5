//! TikTok analytics, history, comments and scheduling through a linked
//! Ayrshare profile.

use chrono::{DateTime, Utc};
use reach_core::metrics::{derive_metrics, DerivedMetrics, RawCounts};
use reach_core::{CreatorProfile, Platform};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{AyrshareAdapter, AyrshareClient};
use crate::error::ProviderError;
use crate::normalize::{FieldAliases, ProfileAdapter};

const TIKTOK: &str = "tiktok";
const DEFAULT_HISTORY_DAYS: u32 = 30;
const MAX_HISTORY_LIMIT: u32 = 100;
const MAX_POST_LENGTH: usize = 2_200;

const ANALYTICS_FOLLOWERS: FieldAliases =
    FieldAliases(&["followerCount", "followersCount", "fans", "follower_count"]);
const ANALYTICS_LIKES: FieldAliases = FieldAliases(&["likeCount", "likesCount", "heart", "totalLikes"]);
const ANALYTICS_VIDEOS: FieldAliases = FieldAliases(&["videoCount", "videos", "video_count"]);
const ANALYTICS_VERIFIED: FieldAliases = FieldAliases(&["isVerified", "verified"]);

const POST_ID: FieldAliases = FieldAliases(&["id", "postId", "videoId"]);
const POST_URL: FieldAliases = FieldAliases(&["postUrl", "shareUrl", "url"]);
const POST_CAPTION: FieldAliases = FieldAliases(&["post", "videoDescription", "caption", "title"]);
const POST_CREATED: FieldAliases = FieldAliases(&["created", "createTime", "publishedAt"]);
const POST_VIEWS: FieldAliases =
    FieldAliases(&["analytics.videoViews", "viewCount", "views", "videoViews"]);
const POST_LIKES: FieldAliases = FieldAliases(&["analytics.likes", "likeCount", "likes"]);
const POST_COMMENTS: FieldAliases = FieldAliases(&["analytics.comments", "commentCount", "comments"]);
const POST_SHARES: FieldAliases = FieldAliases(&["analytics.shares", "shareCount", "shares"]);

const COMMENT_ID: FieldAliases = FieldAliases(&["commentId", "id"]);
const COMMENT_TEXT: FieldAliases = FieldAliases(&["comment", "text"]);
const COMMENT_USER: FieldAliases = FieldAliases(&["userName", "username", "user.username"]);
const COMMENT_LIKES: FieldAliases = FieldAliases(&["likeCount", "likes"]);
const COMMENT_CREATED: FieldAliases = FieldAliases(&["created", "createTime"]);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TikTokAnalyticsSnapshot {
    pub profile: CreatorProfile,
    pub metrics: DerivedMetrics,
    /// The vendor's analytics object, unmodified.
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMetrics {
    pub id: String,
    pub post_url: Option<String>,
    pub caption: Option<String>,
    pub created: Option<String>,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostComment {
    pub id: String,
    pub text: String,
    pub username: Option<String>,
    pub likes: u64,
    pub created: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub last_days: Option<u32>,
    pub limit: Option<u32>,
}

/// A TikTok post to publish now or at `schedule_date`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePost {
    #[serde(default)]
    pub post: String,
    #[serde(default)]
    pub media_urls: Vec<String>,
    pub schedule_date: Option<DateTime<Utc>>,
}

impl SchedulePost {
    /// Checks the post against TikTok's publishing rules as of `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidRequest`] when no video is attached,
    /// the caption is too long, or the schedule date is not in the future.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ProviderError> {
        if self.media_urls.iter().all(|u| u.trim().is_empty()) {
            return Err(ProviderError::InvalidRequest(
                "TikTok posts require a video in mediaUrls".to_string(),
            ));
        }
        if self.post.chars().count() > MAX_POST_LENGTH {
            return Err(ProviderError::InvalidRequest(format!(
                "post text exceeds {MAX_POST_LENGTH} characters"
            )));
        }
        if let Some(at) = self.schedule_date {
            if at <= now {
                return Err(ProviderError::InvalidRequest(
                    "scheduleDate must be in the future".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn tiktok_section(raw: &Value) -> Result<&Value, ProviderError> {
    raw.get(TIKTOK)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ProviderError::NotFound {
            platform: Platform::TikTok.to_string(),
        })
}

/// Items of a list payload that may be bare, or wrapped under one of `keys`.
fn list_items<'a>(raw: &'a Value, keys: &[&str]) -> &'a [Value] {
    if let Some(items) = raw.as_array() {
        return items;
    }
    keys.iter()
        .find_map(|k| raw.get(*k).and_then(Value::as_array))
        .map_or(&[][..], Vec::as_slice)
}

fn post_metrics(raw: &Value) -> Option<PostMetrics> {
    Some(PostMetrics {
        id: POST_ID.str(raw)?,
        post_url: POST_URL.str(raw),
        caption: POST_CAPTION.str(raw),
        created: POST_CREATED.str(raw),
        views: POST_VIEWS.u64(raw).unwrap_or(0),
        likes: POST_LIKES.u64(raw).unwrap_or(0),
        comments: POST_COMMENTS.u64(raw).unwrap_or(0),
        shares: POST_SHARES.u64(raw).unwrap_or(0),
    })
}

fn post_comment(raw: &Value) -> Option<PostComment> {
    Some(PostComment {
        id: COMMENT_ID.str(raw)?,
        text: COMMENT_TEXT.str(raw).unwrap_or_default(),
        username: COMMENT_USER.str(raw),
        likes: COMMENT_LIKES.u64(raw).unwrap_or(0),
        created: COMMENT_CREATED.str(raw),
    })
}

impl AyrshareClient {
    /// Account-level TikTok analytics plus derived metrics.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::NotFound`] if the response has no `tiktok` entry.
    /// - [`ProviderError::Vendor`] on a non-2xx response.
    pub async fn tiktok_analytics(
        &self,
        profile_key: &str,
    ) -> Result<TikTokAnalyticsSnapshot, ProviderError> {
        let raw = self
            .http
            .post_json(
                "analytics/social",
                &json!({ "platforms": [TIKTOK] }),
                Some(profile_key),
            )
            .await?;
        let section = tiktok_section(&raw)?;
        let analytics = section.get("analytics").unwrap_or(section);

        let counts = RawCounts {
            followers: ANALYTICS_FOLLOWERS.u64(analytics).unwrap_or(0),
            likes: ANALYTICS_LIKES.u64(analytics).unwrap_or(0),
            video_count: ANALYTICS_VIDEOS.u64(analytics).unwrap_or(0),
            verified: ANALYTICS_VERIFIED.bool(analytics).unwrap_or(false),
            recent_views: Vec::new(),
        };
        let metrics = derive_metrics(&counts);
        let mut profile = AyrshareAdapter::new(Platform::TikTok).normalize(analytics);
        profile.follower_count = counts.followers;
        profile.set_engagement_rate(metrics.engagement_rate / 100.0);

        Ok(TikTokAnalyticsSnapshot {
            profile,
            metrics,
            raw: analytics.clone(),
        })
    }

    /// Recent TikTok posts published through the profile, with per-post stats.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Vendor`] on a non-2xx response.
    pub async fn tiktok_history(
        &self,
        profile_key: &str,
        query: &HistoryQuery,
    ) -> Result<Vec<PostMetrics>, ProviderError> {
        let last_days = query.last_days.unwrap_or(DEFAULT_HISTORY_DAYS).to_string();
        let limit = query.limit.map(|l| l.clamp(1, MAX_HISTORY_LIMIT).to_string());
        let mut params = vec![("lastDays", last_days.as_str())];
        if let Some(limit) = &limit {
            params.push(("limit", limit.as_str()));
        }
        let raw = self
            .http
            .get_json("history/tiktok", &params, Some(profile_key))
            .await?;
        Ok(list_items(&raw, &["posts", "history", TIKTOK])
            .iter()
            .filter_map(post_metrics)
            .collect())
    }

    /// Comments on one TikTok post.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::InvalidRequest`] if `post_id` is blank or is not a
    ///   single path segment; the vendor is not called.
    /// - [`ProviderError::Vendor`] on a non-2xx response.
    pub async fn tiktok_comments(
        &self,
        profile_key: &str,
        post_id: &str,
    ) -> Result<Vec<PostComment>, ProviderError> {
        let path = comments_path(post_id)?;
        let raw = self
            .http
            .get_json(&path, &[("platform", TIKTOK)], Some(profile_key))
            .await?;
        Ok(list_items(&raw, &[TIKTOK, "comments"])
            .iter()
            .filter_map(post_comment)
            .collect())
    }

    /// Publishes or schedules a TikTok post.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::InvalidRequest`] if the post fails validation; the
    ///   vendor is not called.
    /// - [`ProviderError::Vendor`] on a non-2xx response.
    pub async fn schedule_tiktok_post(
        &self,
        profile_key: &str,
        post: &SchedulePost,
    ) -> Result<Value, ProviderError> {
        post.validate(Utc::now())?;
        let mut body = json!({
            "post": post.post,
            "platforms": [TIKTOK],
            "mediaUrls": post.media_urls,
        });
        if let Some(at) = post.schedule_date {
            body["scheduleDate"] =
                Value::String(at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true));
        }
        self.http.post_json("post", &body, Some(profile_key)).await
    }
}

/// `comments/<id>` for a vendor post id, which must be a single path segment.
fn comments_path(post_id: &str) -> Result<String, ProviderError> {
    let post_id = post_id.trim();
    if post_id.is_empty() {
        return Err(ProviderError::InvalidRequest(
            "postId is required".to_string(),
        ));
    }
    if !post_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
    {
        return Err(ProviderError::InvalidRequest(format!(
            "postId '{post_id}' must contain only letters, digits, '-' or '_'"
        )));
    }
    Ok(format!("comments/{post_id}"))
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn post() -> SchedulePost {
        SchedulePost {
            post: "New drop".to_string(),
            media_urls: vec!["https://cdn.example/v.mp4".to_string()],
            schedule_date: None,
        }
    }

    #[test]
    fn schedule_requires_video() {
        let mut p = post();
        p.media_urls.clear();
        assert!(matches!(
            p.validate(Utc::now()),
            Err(ProviderError::InvalidRequest(_))
        ));
    }

    #[test]
    fn schedule_date_must_be_in_future() {
        let now = Utc::now();
        let mut p = post();
        p.schedule_date = Some(now - TimeDelta::minutes(5));
        assert!(p.validate(now).is_err());
        p.schedule_date = Some(now + TimeDelta::hours(1));
        assert!(p.validate(now).is_ok());
    }

    #[test]
    fn caption_length_is_bounded() {
        let mut p = post();
        p.post = "a".repeat(MAX_POST_LENGTH + 1);
        assert!(p.validate(Utc::now()).is_err());
    }

    #[test]
    fn list_items_accepts_bare_and_wrapped_arrays() {
        let bare = json!([{"id": "1"}]);
        let wrapped = json!({"posts": [{"id": "1"}, {"id": "2"}]});
        assert_eq!(list_items(&bare, &["posts"]).len(), 1);
        assert_eq!(list_items(&wrapped, &["posts"]).len(), 2);
        assert!(list_items(&json!({}), &["posts"]).is_empty());
    }

    #[test]
    fn post_metrics_reads_nested_analytics() {
        let raw = json!({
            "id": "abc",
            "postUrl": "https://tiktok.com/@acme/video/1",
            "analytics": {"videoViews": 1200, "likes": 90, "comments": 4, "shares": 2}
        });
        let m = post_metrics(&raw).unwrap();
        assert_eq!(m.views, 1200);
        assert_eq!(m.likes, 90);
        assert_eq!(m.shares, 2);
    }

    #[test]
    fn missing_tiktok_section_is_not_found() {
        let err = tiktok_section(&json!({"status": "success"})).unwrap_err();
        assert!(matches!(err, ProviderError::NotFound { .. }));
    }

    #[test]
    fn comments_path_keeps_plain_ids() {
        assert_eq!(comments_path(" Rx7_a-9 ").unwrap(), "comments/Rx7_a-9");
    }

    #[test]
    fn comments_path_rejects_ids_that_change_the_route() {
        let ids = [
            "", "  ", "..", "../profiles", "a/b", "abc?platform=x", "abc#frag", "%2e%2e",
        ];
        for id in ids {
            assert!(
                matches!(comments_path(id), Err(ProviderError::InvalidRequest(_))),
                "{id:?} should be rejected"
            );
        }
    }
}
