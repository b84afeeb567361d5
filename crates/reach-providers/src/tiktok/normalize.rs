use reach_core::metrics::{derive_metrics, DerivedMetrics, RawCounts};
use reach_core::{CreatorProfile, Platform};
use serde::Serialize;
use serde_json::Value;

use crate::normalize::{FieldAliases, ProfileAdapter};

const OPEN_ID: FieldAliases = FieldAliases(&["open_id", "union_id"]);
const USERNAME: FieldAliases = FieldAliases(&["username"]);
const DISPLAY_NAME: FieldAliases = FieldAliases(&["display_name"]);
const AVATAR: FieldAliases = FieldAliases(&["avatar_large_url", "avatar_url_100", "avatar_url"]);
const BIO: FieldAliases = FieldAliases(&["bio_description"]);
const VERIFIED: FieldAliases = FieldAliases(&["is_verified"]);
const FOLLOWERS: FieldAliases = FieldAliases(&["follower_count"]);
const FOLLOWING: FieldAliases = FieldAliases(&["following_count"]);
const LIKES: FieldAliases = FieldAliases(&["likes_count"]);
const VIDEOS: FieldAliases = FieldAliases(&["video_count"]);

const VIDEO_ID: FieldAliases = FieldAliases(&["id"]);
const VIDEO_TITLE: FieldAliases = FieldAliases(&["title"]);
const VIDEO_DESCRIPTION: FieldAliases = FieldAliases(&["video_description"]);
const VIDEO_COVER: FieldAliases = FieldAliases(&["cover_image_url"]);
const VIDEO_SHARE_URL: FieldAliases = FieldAliases(&["share_url", "embed_link"]);
const VIDEO_CREATED: FieldAliases = FieldAliases(&["create_time"]);
const VIEW_COUNT: FieldAliases = FieldAliases(&["view_count"]);
const LIKE_COUNT: FieldAliases = FieldAliases(&["like_count"]);
const COMMENT_COUNT: FieldAliases = FieldAliases(&["comment_count"]);
const SHARE_COUNT: FieldAliases = FieldAliases(&["share_count"]);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStats {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub share_url: Option<String>,
    /// Unix seconds.
    pub create_time: Option<u64>,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub share_count: u64,
}

impl VideoStats {
    fn from_raw(raw: &Value) -> Option<Self> {
        Some(Self {
            id: VIDEO_ID.str(raw)?,
            title: VIDEO_TITLE.str(raw),
            description: VIDEO_DESCRIPTION.str(raw),
            cover_image_url: VIDEO_COVER.str(raw),
            share_url: VIDEO_SHARE_URL.str(raw),
            create_time: VIDEO_CREATED.u64(raw),
            view_count: VIEW_COUNT.u64(raw).unwrap_or(0),
            like_count: LIKE_COUNT.u64(raw).unwrap_or(0),
            comment_count: COMMENT_COUNT.u64(raw).unwrap_or(0),
            share_count: SHARE_COUNT.u64(raw).unwrap_or(0),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TikTokAnalytics {
    pub profile: CreatorProfile,
    pub metrics: DerivedMetrics,
    pub videos: Vec<VideoStats>,
}

/// Normalizes a Display or Research API user object.
#[derive(Debug, Clone, Copy, Default)]
pub struct TikTokAdapter;

impl ProfileAdapter for TikTokAdapter {
    fn platform(&self) -> Platform {
        Platform::TikTok
    }

    fn normalize(&self, raw: &Value) -> CreatorProfile {
        let username = USERNAME.str(raw).unwrap_or_default();
        let id = OPEN_ID.str(raw).unwrap_or_else(|| username.clone());
        let mut profile = CreatorProfile::new(Platform::TikTok, id, username);
        profile.display_name = DISPLAY_NAME.str(raw);
        profile.avatar_url = AVATAR.str(raw);
        profile.bio = BIO.str(raw);
        profile.verified = VERIFIED.bool(raw).unwrap_or(false);
        profile.follower_count = FOLLOWERS.u64(raw).unwrap_or(0);
        profile.following_count = FOLLOWING.u64(raw);
        profile.post_count = VIDEOS.u64(raw);
        profile
    }
}

/// Profile, derived metrics and per-video stats from a user object and its
/// recent videos.
#[must_use]
pub fn build_analytics(user: &Value, videos: &[Value]) -> TikTokAnalytics {
    let mut profile = TikTokAdapter.normalize(user);
    let videos: Vec<VideoStats> = videos.iter().filter_map(VideoStats::from_raw).collect();

    let counts = RawCounts {
        followers: profile.follower_count,
        likes: LIKES.u64(user).unwrap_or(0),
        video_count: profile.post_count.unwrap_or(0),
        verified: profile.verified,
        recent_views: videos.iter().map(|v| v.view_count).collect(),
    };
    let metrics = derive_metrics(&counts);

    profile.set_engagement_rate(metrics.engagement_rate / 100.0);
    profile.avg_likes = Some(metrics.avg_likes_per_video);
    if !videos.is_empty() {
        profile.avg_views = Some(metrics.avg_views);
    }

    TikTokAnalytics {
        profile,
        metrics,
        videos,
    }
}
