//! Modash discovery API: influencer search, filter dictionaries and account
//! status.

mod dictionaries;
mod search;
mod status;

pub use search::{
    match_badges, CreatorResult, ModashAdapter, Pagination, SearchMeta, SearchRequest, SearchResponse,
    DEFAULT_ESTIMATED_CREDITS, DEFAULT_PAGE_SIZE,
};
pub use status::{service_status, ServiceHealth, ServiceStatus, LOW_CREDIT_THRESHOLD};

use reach_core::ProviderConfig;

use crate::error::ProviderError;
use crate::http::{Provider, VendorClient};

pub struct ModashClient {
    http: VendorClient,
}

impl ModashClient {
    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] when `MODASH_API_KEY` is
    /// unset, or an HTTP/URL error if the client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .modash_api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured {
                provider: Provider::Modash,
                setting: "MODASH_API_KEY",
            })?;
        Ok(Self {
            http: VendorClient::new(
                Provider::Modash,
                &config.modash_base_url,
                Some(api_key),
                config.request_timeout_secs,
                &config.user_agent,
            )?,
        })
    }
}
