//! Derived creator metrics computed from raw vendor counts.
//!
//! Every function here is total: zero followers, zero videos or an empty
//! view list produce `0` rather than an error or a non-finite value. The
//! scoring coefficients are product-tuned and must not be re-derived.

use serde::{Deserialize, Serialize};

/// Multiplier applied to `log10(followers)`; contribution capped at 40.
const FOLLOWER_WEIGHT: f64 = 8.0;
const FOLLOWER_CAP: f64 = 40.0;
/// Multiplier applied to the engagement-rate percentage; capped at 30.
const ENGAGEMENT_WEIGHT: f64 = 6.0;
const ENGAGEMENT_CAP: f64 = 30.0;
const VERIFIED_BONUS: f64 = 20.0;
/// Videos are divided by this; contribution capped at 10.
const VIDEO_DIVISOR: f64 = 10.0;
const VIDEO_CAP: f64 = 10.0;
const MAX_SCORE: f64 = 100.0;
/// A post is viral when its views exceed this multiple of the mean.
const VIRAL_MULTIPLIER: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostingFrequency {
    #[serde(rename = "Very High")]
    VeryHigh,
    High,
    Medium,
    Low,
    #[serde(rename = "Very Low")]
    VeryLow,
}

impl PostingFrequency {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PostingFrequency::VeryHigh => "Very High",
            PostingFrequency::High => "High",
            PostingFrequency::Medium => "Medium",
            PostingFrequency::Low => "Low",
            PostingFrequency::VeryLow => "Very Low",
        }
    }
}

impl std::fmt::Display for PostingFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Engagement rate as a percentage: `likes / (followers * videos) * 100`.
///
/// Returns `0.0` when either `followers` or `video_count` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn engagement_rate(likes: u64, followers: u64, video_count: u64) -> f64 {
    if followers == 0 || video_count == 0 {
        return 0.0;
    }
    let denominator = followers as f64 * video_count as f64;
    let rate = likes as f64 / denominator * 100.0;
    if rate.is_finite() {
        rate
    } else {
        0.0
    }
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn avg_likes_per_video(likes: u64, video_count: u64) -> f64 {
    likes as f64 / video_count.max(1) as f64
}

#[must_use]
pub fn posting_frequency(video_count: u64) -> PostingFrequency {
    match video_count {
        200.. => PostingFrequency::VeryHigh,
        100..=199 => PostingFrequency::High,
        50..=99 => PostingFrequency::Medium,
        20..=49 => PostingFrequency::Low,
        _ => PostingFrequency::VeryLow,
    }
}

/// Composite 0–100 score from reach, engagement, verification and output.
///
/// `engagement_rate_pct` is the percentage returned by [`engagement_rate`].
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn influence_score(
    followers: u64,
    engagement_rate_pct: f64,
    verified: bool,
    video_count: u64,
) -> u8 {
    let reach = if followers == 0 {
        0.0
    } else {
        ((followers as f64).log10() * FOLLOWER_WEIGHT).clamp(0.0, FOLLOWER_CAP)
    };
    let engagement = if engagement_rate_pct.is_finite() {
        (engagement_rate_pct * ENGAGEMENT_WEIGHT).clamp(0.0, ENGAGEMENT_CAP)
    } else {
        0.0
    };
    let verification = if verified { VERIFIED_BONUS } else { 0.0 };
    let output = (video_count as f64 / VIDEO_DIVISOR).clamp(0.0, VIDEO_CAP);

    let total = (reach + engagement + verification + output)
        .round()
        .clamp(0.0, MAX_SCORE);
    total as u8
}

/// Percentage of posts whose views exceed three times the mean view count.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn viral_content_percentage(views: &[u64]) -> f64 {
    if views.is_empty() {
        return 0.0;
    }
    let mean = average_views(views);
    if mean <= 0.0 {
        return 0.0;
    }
    let threshold = mean * VIRAL_MULTIPLIER;
    let viral = views.iter().filter(|&&v| v as f64 > threshold).count();
    viral as f64 / views.len() as f64 * 100.0
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_views(views: &[u64]) -> f64 {
    if views.is_empty() {
        return 0.0;
    }
    let total: f64 = views.iter().map(|&v| v as f64).sum();
    total / views.len() as f64
}

/// Raw counts as reported by a vendor for one account.
#[derive(Debug, Clone, Default)]
pub struct RawCounts {
    pub followers: u64,
    pub likes: u64,
    pub video_count: u64,
    pub verified: bool,
    /// View counts of the recent posts the vendor returned, newest first.
    pub recent_views: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    /// Percentage, not a fraction.
    pub engagement_rate: f64,
    pub avg_likes_per_video: f64,
    pub avg_views: f64,
    pub posting_frequency: PostingFrequency,
    pub influence_score: u8,
    pub viral_content_percentage: f64,
}

#[must_use]
pub fn derive_metrics(counts: &RawCounts) -> DerivedMetrics {
    let rate = engagement_rate(counts.likes, counts.followers, counts.video_count);
    DerivedMetrics {
        engagement_rate: rate,
        avg_likes_per_video: avg_likes_per_video(counts.likes, counts.video_count),
        avg_views: average_views(&counts.recent_views),
        posting_frequency: posting_frequency(counts.video_count),
        influence_score: influence_score(
            counts.followers,
            rate,
            counts.verified,
            counts.video_count,
        ),
        viral_content_percentage: viral_content_percentage(&counts.recent_views),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engagement_rate_is_zero_without_followers_or_videos() {
        assert!(engagement_rate(500, 0, 10).abs() < f64::EPSILON);
        assert!(engagement_rate(500, 1_000, 0).abs() < f64::EPSILON);
        assert!(engagement_rate(0, 0, 0).abs() < f64::EPSILON);
    }

    #[test]
    fn engagement_rate_matches_formula() {
        // 5_000 / (1_000 * 10) * 100 = 50
        assert!((engagement_rate(5_000, 1_000, 10) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn engagement_rate_is_finite_and_non_negative_for_large_inputs() {
        for followers in [0, 1, 999, 1_000_000, u64::MAX] {
            let rate = engagement_rate(u64::MAX, followers, u64::MAX);
            assert!(rate.is_finite(), "followers={followers}");
            assert!(rate >= 0.0, "followers={followers}");
        }
    }

    #[test]
    fn avg_likes_guards_zero_videos() {
        assert!((avg_likes_per_video(300, 0) - 300.0).abs() < f64::EPSILON);
        assert!((avg_likes_per_video(300, 3) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn posting_frequency_boundaries() {
        assert_eq!(posting_frequency(200), PostingFrequency::VeryHigh);
        assert_eq!(posting_frequency(199), PostingFrequency::High);
        assert_eq!(posting_frequency(100), PostingFrequency::High);
        assert_eq!(posting_frequency(99), PostingFrequency::Medium);
        assert_eq!(posting_frequency(50), PostingFrequency::Medium);
        assert_eq!(posting_frequency(49), PostingFrequency::Low);
        assert_eq!(posting_frequency(20), PostingFrequency::Low);
        assert_eq!(posting_frequency(19), PostingFrequency::VeryLow);
        assert_eq!(posting_frequency(0), PostingFrequency::VeryLow);
    }

    #[test]
    fn posting_frequency_label_matches_serde_name() {
        assert_eq!(PostingFrequency::VeryHigh.label(), "Very High");
        assert_eq!(
            serde_json::to_string(&PostingFrequency::VeryLow).unwrap(),
            "\"Very Low\""
        );
    }

    #[test]
    fn influence_score_combines_weighted_parts() {
        // log10(100_000) * 8 = 40 (capped), 2.0% * 6 = 12, verified 20, 50/10 = 5
        assert_eq!(influence_score(100_000, 2.0, true, 50), 77);
        // 1_000 followers -> 24, 0 engagement, unverified, 0 videos
        assert_eq!(influence_score(1_000, 0.0, false, 0), 24);
    }

    #[test]
    fn influence_score_stays_within_bounds() {
        assert_eq!(influence_score(0, 0.0, false, 0), 0);
        assert_eq!(influence_score(u64::MAX, 1e9, true, u64::MAX), 100);
        assert_eq!(influence_score(10, f64::NAN, false, 0), 8);
        assert_eq!(influence_score(10, -50.0, false, 0), 8);
        for followers in [0_u64, 1, 10, 12_345, 10_000_000] {
            for rate in [0.0, 0.5, 4.9, 100.0] {
                for videos in [0_u64, 5, 1_000] {
                    let score = influence_score(followers, rate, followers % 2 == 0, videos);
                    assert!(score <= 100);
                }
            }
        }
    }

    #[test]
    fn viral_percentage_counts_posts_above_three_times_mean() {
        // mean = (10*9 + 1000) / 10 = 109; threshold 327; one viral post
        let mut views = vec![10_u64; 9];
        views.push(1_000);
        assert!((viral_content_percentage(&views) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn viral_percentage_handles_empty_and_zero_views() {
        assert!(viral_content_percentage(&[]).abs() < f64::EPSILON);
        assert!(viral_content_percentage(&[0, 0, 0]).abs() < f64::EPSILON);
        assert!(viral_content_percentage(&[50, 50]).abs() < f64::EPSILON);
    }

    #[test]
    fn derive_metrics_bundles_every_metric() {
        let counts = RawCounts {
            followers: 10_000,
            likes: 200_000,
            video_count: 100,
            verified: false,
            recent_views: vec![1_000, 2_000, 3_000],
        };
        let metrics = derive_metrics(&counts);
        assert!((metrics.engagement_rate - 20.0).abs() < 1e-9);
        assert!((metrics.avg_likes_per_video - 2_000.0).abs() < 1e-9);
        assert!((metrics.avg_views - 2_000.0).abs() < 1e-9);
        assert_eq!(metrics.posting_frequency, PostingFrequency::High);
        // 32 (reach) + 30 (engagement cap) + 0 + 10 (video cap)
        assert_eq!(metrics.influence_score, 72);
        assert!(metrics.viral_content_percentage.abs() < f64::EPSILON);
    }
}
