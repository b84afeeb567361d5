//! Ayrshare business API: user profiles, JWT linking, brand lookups and the
//! TikTok analytics/posting endpoints exposed through a linked profile.

mod auth;
mod lookup;
mod normalize;
mod tiktok;

pub use auth::{AuthUrl, CreatedProfile, JwtGrant, ProfileStatus};
pub use lookup::{LookupProfile, LookupResult, LOOKUP_PLATFORMS};
pub use normalize::AyrshareAdapter;
pub use tiktok::{HistoryQuery, PostComment, PostMetrics, SchedulePost, TikTokAnalyticsSnapshot};

use reach_core::ProviderConfig;

use crate::error::ProviderError;
use crate::http::{Provider, VendorClient};

/// Client for the Ayrshare REST API.
///
/// The business API key is sent as the bearer token on every request; calls
/// scoped to one user profile also carry that profile's `Profile-Key`.
pub struct AyrshareClient {
    http: VendorClient,
    private_key: Option<String>,
    domain: Option<String>,
}

impl AyrshareClient {
    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] when `AYRSHARE_API_KEY` is
    /// unset, or an HTTP/URL error if the client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .ayrshare_api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured {
                provider: Provider::Ayrshare,
                setting: "AYRSHARE_API_KEY",
            })?;
        let http = VendorClient::new(
            Provider::Ayrshare,
            &config.ayrshare_base_url,
            Some(api_key),
            config.request_timeout_secs,
            &config.user_agent,
        )?;
        Ok(Self {
            http,
            private_key: config.ayrshare_private_key.clone(),
            domain: config.ayrshare_domain.clone(),
        })
    }

    fn private_key(&self) -> Result<&str, ProviderError> {
        self.private_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured {
                provider: Provider::Ayrshare,
                setting: "AYRSHARE_PRIVATE_KEY",
            })
    }

    fn domain(&self) -> Result<&str, ProviderError> {
        self.domain.as_deref().ok_or(ProviderError::NotConfigured {
            provider: Provider::Ayrshare,
            setting: "AYRSHARE_DOMAIN",
        })
    }
}
