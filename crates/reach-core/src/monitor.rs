//! Brand-monitor rule evaluation.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::platform::Platform;

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([\p{L}\p{N}_]+)").expect("valid hashtag regex"));

/// Saved rule set for a brand monitor.
///
/// An empty `platforms` list means every platform. Thresholds left as `None`
/// are not applied. `min_engagement_rate` is a 0–1 fraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorRule {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<Platform>,
    pub min_followers: Option<u64>,
    pub min_engagement_rate: Option<f64>,
}

impl MonitorRule {
    /// Lower-cases keywords and strips leading `#` from hashtags, dropping
    /// blanks and duplicates.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.keywords = dedup_terms(self.keywords.iter().map(|k| k.trim().to_lowercase()));
        self.hashtags = dedup_terms(
            self.hashtags
                .iter()
                .map(|h| h.trim().trim_start_matches('#').to_lowercase()),
        );
        self
    }

    #[must_use]
    pub fn has_terms(&self) -> bool {
        !self.keywords.is_empty() || !self.hashtags.is_empty()
    }
}

fn dedup_terms(terms: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    terms
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// A post observed on a platform, as submitted for monitor evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservedPost {
    pub platform: Platform,
    pub external_post_id: String,
    pub author_username: Option<String>,
    #[serde(default)]
    pub content: String,
    pub url: Option<String>,
    pub follower_count: Option<u64>,
    pub engagement_rate: Option<f64>,
    pub posted_at: Option<DateTime<Utc>>,
}

/// Returns the hashtags in `content`, lower-cased and without the `#`.
#[must_use]
pub fn extract_hashtags(content: &str) -> HashSet<String> {
    HASHTAG_RE
        .captures_iter(content)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Evaluates `post` against `rule`.
///
/// Returns the matched terms (keywords as-is, hashtags prefixed with `#`) when
/// the post passes the platform filter and thresholds and matches at least
/// one term; `None` otherwise. Expects a rule produced by
/// [`MonitorRule::normalized`].
#[must_use]
pub fn match_post(rule: &MonitorRule, post: &ObservedPost) -> Option<Vec<String>> {
    if !rule.platforms.is_empty() && !rule.platforms.contains(&post.platform) {
        return None;
    }
    if let Some(min) = rule.min_followers {
        if post.follower_count.unwrap_or(0) < min {
            return None;
        }
    }
    if let Some(min) = rule.min_engagement_rate {
        if post.engagement_rate.unwrap_or(0.0) < min {
            return None;
        }
    }

    let content = post.content.to_lowercase();
    let tags = extract_hashtags(&post.content);

    let mut matched: Vec<String> = rule
        .keywords
        .iter()
        .filter(|k| content.contains(k.as_str()))
        .cloned()
        .collect();
    matched.extend(
        rule.hashtags
            .iter()
            .filter(|h| tags.contains(h.as_str()))
            .map(|h| format!("#{h}")),
    );

    if matched.is_empty() {
        None
    } else {
        Some(matched)
    }
}
