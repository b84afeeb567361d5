use reach_core::metrics;
use reach_core::{CreatorProfile, Platform};
use serde_json::Value;

use crate::normalize::{engagement_fraction, FieldAliases, ProfileAdapter};

/// Vendor field names for one Ayrshare platform payload.
struct FieldMap {
    id: FieldAliases,
    username: FieldAliases,
    display_name: FieldAliases,
    avatar: FieldAliases,
    followers: FieldAliases,
    following: FieldAliases,
    posts: FieldAliases,
    likes: FieldAliases,
    engagement: FieldAliases,
    avg_views: FieldAliases,
    verified: FieldAliases,
    bio: FieldAliases,
}

const INSTAGRAM: FieldMap = FieldMap {
    id: FieldAliases(&["id", "igId", "ig_id"]),
    username: FieldAliases(&["username"]),
    display_name: FieldAliases(&["name", "displayName"]),
    avatar: FieldAliases(&["profilePictureUrl", "profile_picture_url"]),
    followers: FieldAliases(&["followersCount", "followers_count"]),
    following: FieldAliases(&["followsCount", "follows_count"]),
    posts: FieldAliases(&["mediaCount", "media_count"]),
    likes: FieldAliases(&["likeCount", "likesCount"]),
    engagement: FieldAliases(&["engagementRate", "engagement_rate"]),
    avg_views: FieldAliases(&["avgViews", "averageViews"]),
    verified: FieldAliases(&["isVerified", "verified"]),
    bio: FieldAliases(&["biography", "bio"]),
};

const TIKTOK: FieldMap = FieldMap {
    id: FieldAliases(&["openId", "open_id", "id"]),
    username: FieldAliases(&["username", "uniqueId", "unique_id"]),
    display_name: FieldAliases(&["displayName", "display_name", "nickname"]),
    avatar: FieldAliases(&["avatarUrl", "avatar_url", "avatarLargerUrl"]),
    followers: FieldAliases(&["fans", "followerCount", "follower_count"]),
    following: FieldAliases(&["following", "followingCount", "following_count"]),
    posts: FieldAliases(&["videos", "videoCount", "video_count"]),
    likes: FieldAliases(&["heart", "likesCount", "likes_count"]),
    engagement: FieldAliases(&["engagementRate"]),
    avg_views: FieldAliases(&["avgViews", "averageViews"]),
    verified: FieldAliases(&["verified", "isVerified", "is_verified"]),
    bio: FieldAliases(&["signature", "bioDescription", "bio_description"]),
};

const FACEBOOK: FieldMap = FieldMap {
    id: FieldAliases(&["id", "pageId"]),
    username: FieldAliases(&["username", "name"]),
    display_name: FieldAliases(&["name"]),
    avatar: FieldAliases(&["picture.data.url", "picture", "pictureUrl"]),
    followers: FieldAliases(&["follower_count", "followersCount", "fan_count", "fanCount"]),
    following: FieldAliases(&["followingCount"]),
    posts: FieldAliases(&["postCount", "posts_count"]),
    likes: FieldAliases(&["fan_count", "likes"]),
    engagement: FieldAliases(&["engagementRate"]),
    avg_views: FieldAliases(&["avgViews"]),
    verified: FieldAliases(&["isVerified", "is_verified", "verified"]),
    bio: FieldAliases(&["about", "description"]),
};

const GENERIC: FieldMap = FieldMap {
    id: FieldAliases(&["id", "userId", "user_id", "channelId"]),
    username: FieldAliases(&["username", "handle", "customUrl", "name"]),
    display_name: FieldAliases(&["displayName", "display_name", "name", "title"]),
    avatar: FieldAliases(&[
        "avatarUrl",
        "profilePictureUrl",
        "profile_picture_url",
        "thumbnailUrl",
        "picture",
    ]),
    followers: FieldAliases(&[
        "followersCount",
        "followerCount",
        "follower_count",
        "subscriberCount",
        "fans",
    ]),
    following: FieldAliases(&["followingCount", "followsCount", "following"]),
    posts: FieldAliases(&["mediaCount", "videoCount", "postsCount", "videos"]),
    likes: FieldAliases(&["likesCount", "likeCount", "heart"]),
    engagement: FieldAliases(&["engagementRate", "engagement_rate"]),
    avg_views: FieldAliases(&["avgViews", "averageViews", "viewCount"]),
    verified: FieldAliases(&["isVerified", "verified", "is_verified"]),
    bio: FieldAliases(&["description", "bio", "biography"]),
};

/// Normalizes one platform's entry in a `brand/byUser` response.
#[derive(Debug, Clone, Copy)]
pub struct AyrshareAdapter {
    platform: Platform,
}

impl AyrshareAdapter {
    #[must_use]
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    fn fields(&self) -> &'static FieldMap {
        match self.platform {
            Platform::Instagram => &INSTAGRAM,
            Platform::TikTok => &TIKTOK,
            Platform::Facebook => &FACEBOOK,
            Platform::YouTube => &GENERIC,
        }
    }
}

impl ProfileAdapter for AyrshareAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    #[allow(clippy::cast_precision_loss)]
    fn normalize(&self, raw: &Value) -> CreatorProfile {
        let fields = self.fields();
        let username = fields.username.str(raw).unwrap_or_default();
        let external_id = fields.id.str(raw).unwrap_or_else(|| username.clone());

        let mut profile = CreatorProfile::new(self.platform, external_id, username);
        profile.display_name = fields.display_name.str(raw);
        profile.avatar_url = fields.avatar.str(raw);
        profile.follower_count = fields.followers.u64(raw).unwrap_or(0);
        profile.following_count = fields.following.u64(raw);
        profile.post_count = fields.posts.u64(raw);
        profile.verified = fields.verified.bool(raw).unwrap_or(false);
        profile.bio = fields.bio.str(raw);
        profile.avg_views = fields.avg_views.f64(raw);

        let likes = fields.likes.u64(raw);
        let posts = profile.post_count.unwrap_or(0);
        if let Some(likes) = likes {
            profile.avg_likes = Some(metrics::avg_likes_per_video(likes, posts));
        }

        let rate = match fields.engagement.f64(raw) {
            Some(reported) => engagement_fraction(reported),
            None => likes.map_or(0.0, |likes| {
                metrics::engagement_rate(likes, profile.follower_count, posts) / 100.0
            }),
        };
        profile.set_engagement_rate(rate);
        profile
    }
}
