use serde::{Deserialize, Serialize};

/// Follower-count bucket used to label creators in lookups and search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FollowerTier {
    Emerging,
    Nano,
    Micro,
    #[serde(rename = "Mid-Tier")]
    MidTier,
    Macro,
    Celebrity,
}

impl FollowerTier {
    /// Lower bounds are inclusive: 1 000 is Nano, 10 000 is Micro,
    /// 50 000 is Mid-Tier, 100 000 is Macro, 1 000 000 is Celebrity.
    #[must_use]
    pub fn from_followers(followers: u64) -> Self {
        match followers {
            0..=999 => FollowerTier::Emerging,
            1_000..=9_999 => FollowerTier::Nano,
            10_000..=49_999 => FollowerTier::Micro,
            50_000..=99_999 => FollowerTier::MidTier,
            100_000..=999_999 => FollowerTier::Macro,
            _ => FollowerTier::Celebrity,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            FollowerTier::Emerging => "Emerging",
            FollowerTier::Nano => "Nano",
            FollowerTier::Micro => "Micro",
            FollowerTier::MidTier => "Mid-Tier",
            FollowerTier::Macro => "Macro",
            FollowerTier::Celebrity => "Celebrity",
        }
    }
}

impl std::fmt::Display for FollowerTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
