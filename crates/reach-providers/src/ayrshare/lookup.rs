use futures::future::join_all;
use reach_core::{CreatorProfile, FollowerTier, Platform};
use serde::Serialize;

use super::{AyrshareAdapter, AyrshareClient};
use crate::error::ProviderError;
use crate::normalize::ProfileAdapter;

/// Platforms queried by a multi-platform brand lookup, in response order.
pub const LOOKUP_PLATFORMS: [Platform; 4] = [
    Platform::Instagram,
    Platform::TikTok,
    Platform::Facebook,
    Platform::YouTube,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupProfile {
    #[serde(flatten)]
    pub profile: CreatorProfile,
    pub tier: FollowerTier,
}

impl From<CreatorProfile> for LookupProfile {
    fn from(profile: CreatorProfile) -> Self {
        let tier = profile.tier();
        Self { profile, tier }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResult {
    pub profiles: Vec<LookupProfile>,
    /// Platforms for which the vendor returned no data.
    pub missing: Vec<Platform>,
}

impl AyrshareClient {
    /// Looks up `username` on one platform via `brand/byUser`.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::NotFound`] when the response has no entry for
    ///   `platform`.
    /// - [`ProviderError::Vendor`] on a non-2xx response.
    pub async fn lookup_profile(
        &self,
        username: &str,
        platform: Platform,
    ) -> Result<LookupProfile, ProviderError> {
        let handle = username.trim().trim_start_matches('@');
        if handle.is_empty() {
            return Err(ProviderError::InvalidRequest(
                "username is required".to_string(),
            ));
        }

        let query = vec![
            ("platforms[0]".to_string(), platform.as_str().to_string()),
            (format!("{}User", platform.as_str()), handle.to_string()),
        ];
        let raw = self
            .http
            .request(reqwest::Method::GET, "brand/byUser")?
            .query(&query)
            .send()
            .await?;

        let entry = raw
            .get(platform.as_str())
            .filter(|v| v.is_object())
            .ok_or_else(|| ProviderError::NotFound {
                platform: platform.to_string(),
            })?;

        let mut profile = AyrshareAdapter::new(platform).normalize(entry);
        if profile.username.is_empty() {
            profile.username = handle.to_string();
        }
        if profile.external_user_id.is_empty() {
            profile.external_user_id.clone_from(&profile.username);
        }
        Ok(profile.into())
    }

    /// Looks up `username` on every platform in `platforms` concurrently.
    ///
    /// Platforms without data are listed in [`LookupResult::missing`].
    ///
    /// # Errors
    ///
    /// - [`ProviderError::NotFound`] when no platform returned data.
    /// - The first non-`NotFound` error when every platform failed.
    pub async fn lookup_profiles(
        &self,
        username: &str,
        platforms: &[Platform],
    ) -> Result<LookupResult, ProviderError> {
        let results = join_all(
            platforms
                .iter()
                .map(|&platform| self.lookup_profile(username, platform)),
        )
        .await;

        let mut profiles = Vec::new();
        let mut missing = Vec::new();
        let mut first_error = None;
        for (platform, result) in platforms.iter().zip(results) {
            match result {
                Ok(profile) => profiles.push(profile),
                Err(ProviderError::NotFound { .. }) => missing.push(*platform),
                Err(e) => {
                    tracing::warn!(platform = %platform, error = %e, "brand lookup failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        if profiles.is_empty() {
            if let Some(e) = first_error {
                return Err(e);
            }
            let names: Vec<&str> = platforms.iter().map(|p| p.as_str()).collect();
            return Err(ProviderError::NotFound {
                platform: names.join(", "),
            });
        }

        Ok(LookupResult { profiles, missing })
    }
}

