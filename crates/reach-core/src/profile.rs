use serde::{Deserialize, Serialize};

use crate::platform::Platform;
use crate::tier::FollowerTier;

/// Vendor-independent view of a creator account.
///
/// `(platform, external_user_id)` identifies a profile. `engagement_rate` is a
/// 0–1 fraction computed from vendor counts; use
/// [`CreatorProfile::set_engagement_rate`] so it never goes negative or NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorProfile {
    pub platform: Platform,
    pub external_user_id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub follower_count: u64,
    pub following_count: Option<u64>,
    pub post_count: Option<u64>,
    engagement_rate: f64,
    pub avg_likes: Option<f64>,
    pub avg_views: Option<f64>,
    pub verified: bool,
    pub bio: Option<String>,
    pub top_audience_country: Option<String>,
    pub top_audience_city: Option<String>,
}

impl CreatorProfile {
    #[must_use]
    pub fn new(
        platform: Platform,
        external_user_id: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            external_user_id: external_user_id.into(),
            username: username.into(),
            display_name: None,
            avatar_url: None,
            follower_count: 0,
            following_count: None,
            post_count: None,
            engagement_rate: 0.0,
            avg_likes: None,
            avg_views: None,
            verified: false,
            bio: None,
            top_audience_country: None,
            top_audience_city: None,
        }
    }

    #[must_use]
    pub fn engagement_rate(&self) -> f64 {
        self.engagement_rate
    }

    /// Store an engagement rate fraction, replacing NaN, infinities and
    /// negative values with `0.0`.
    pub fn set_engagement_rate(&mut self, rate: f64) {
        self.engagement_rate = if rate.is_finite() && rate > 0.0 {
            rate
        } else {
            0.0
        };
    }

    #[must_use]
    pub fn tier(&self) -> FollowerTier {
        FollowerTier::from_followers(self.follower_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_engagement_rate_rejects_negative_and_nan() {
        let mut profile = CreatorProfile::new(Platform::Instagram, "1", "creator");
        profile.set_engagement_rate(-0.5);
        assert!(profile.engagement_rate().abs() < f64::EPSILON);
        profile.set_engagement_rate(f64::NAN);
        assert!(profile.engagement_rate().abs() < f64::EPSILON);
        profile.set_engagement_rate(0.034);
        assert!((profile.engagement_rate() - 0.034).abs() < f64::EPSILON);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let mut profile = CreatorProfile::new(Platform::TikTok, "abc", "dancer");
        profile.follower_count = 12_000;
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["externalUserId"], "abc");
        assert_eq!(json["followerCount"], 12_000);
        assert_eq!(json["platform"], "tiktok");
        assert!(json.get("engagementRate").is_some());
    }
}
