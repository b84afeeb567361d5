use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Social platforms a creator profile can belong to.
///
/// `Facebook` is only reachable through Ayrshare brand lookups; Modash and
/// the TikTok APIs never produce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    #[serde(rename = "tiktok")]
    TikTok,
    #[serde(rename = "youtube")]
    YouTube,
    Facebook,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Instagram,
        Platform::TikTok,
        Platform::YouTube,
        Platform::Facebook,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::TikTok => "tiktok",
            Platform::YouTube => "youtube",
            Platform::Facebook => "facebook",
        }
    }

    /// Whether Modash indexes creators on this platform.
    #[must_use]
    pub fn is_discoverable(self) -> bool {
        !matches!(self, Platform::Facebook)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instagram" | "ig" => Ok(Platform::Instagram),
            "tiktok" => Ok(Platform::TikTok),
            "youtube" | "yt" => Ok(Platform::YouTube),
            "facebook" | "fb" => Ok(Platform::Facebook),
            other => Err(CoreError::UnsupportedPlatform(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_accepts_aliases_case_insensitively() {
        assert_eq!("Instagram".parse::<Platform>().unwrap(), Platform::Instagram);
        assert_eq!(" TikTok ".parse::<Platform>().unwrap(), Platform::TikTok);
        assert_eq!("yt".parse::<Platform>().unwrap(), Platform::YouTube);
        assert_eq!("fb".parse::<Platform>().unwrap(), Platform::Facebook);
    }

    #[test]
    fn from_str_rejects_unknown_platform() {
        let err = "myspace".parse::<Platform>().unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedPlatform(ref p) if p == "myspace"));
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Platform::TikTok).unwrap();
        assert_eq!(json, "\"tiktok\"");
        let parsed: Platform = serde_json::from_str("\"youtube\"").unwrap();
        assert_eq!(parsed, Platform::YouTube);
    }

    #[test]
    fn facebook_is_not_discoverable() {
        assert!(!Platform::Facebook.is_discoverable());
        assert!(Platform::Instagram.is_discoverable());
    }
}
