use reach_core::ProviderConfig;

use crate::ayrshare::AyrshareClient;
use crate::error::ProviderError;
use crate::http::Provider;
use crate::identity::IdentityClient;
use crate::modash::ModashClient;
use crate::tiktok::TikTokClient;

/// Every vendor client, built once at startup from [`ProviderConfig`].
///
/// A provider whose credentials are absent is left unset; asking for it
/// returns [`ProviderError::NotConfigured`] at request time.
#[derive(Default)]
pub struct ProviderSet {
    ayrshare: Option<AyrshareClient>,
    modash: Option<ModashClient>,
    tiktok: Option<TikTokClient>,
    identity: Option<IdentityClient>,
}

/// Builds an optional client, treating a missing credential as "not
/// configured" and any other failure as fatal.
fn optional<T>(result: Result<T, ProviderError>) -> Result<Option<T>, ProviderError> {
    match result {
        Ok(client) => Ok(Some(client)),
        Err(ProviderError::NotConfigured { provider, setting }) => {
            tracing::info!(%provider, setting, "provider disabled: missing setting");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

impl ProviderSet {
    /// # Errors
    ///
    /// Returns [`ProviderError`] if a configured client cannot be built, e.g.
    /// because its base URL is invalid.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let identity = match (&config.supabase_url, &config.supabase_anon_key) {
            (Some(url), Some(key)) => Some(IdentityClient::new(
                url,
                key,
                config.request_timeout_secs,
                &config.user_agent,
            )?),
            _ => {
                tracing::info!("identity provider disabled: SUPABASE_URL or SUPABASE_ANON_KEY unset");
                None
            }
        };
        Ok(Self {
            ayrshare: optional(AyrshareClient::new(config))?,
            modash: optional(ModashClient::new(config))?,
            tiktok: optional(TikTokClient::new(config))?,
            identity,
        })
    }

    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] when Ayrshare is disabled.
    pub fn ayrshare(&self) -> Result<&AyrshareClient, ProviderError> {
        self.ayrshare.as_ref().ok_or(ProviderError::NotConfigured {
            provider: Provider::Ayrshare,
            setting: "AYRSHARE_API_KEY",
        })
    }

    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] when Modash is disabled.
    pub fn modash(&self) -> Result<&ModashClient, ProviderError> {
        self.modash.as_ref().ok_or(ProviderError::NotConfigured {
            provider: Provider::Modash,
            setting: "MODASH_API_KEY",
        })
    }

    #[must_use]
    pub fn modash_if_configured(&self) -> Option<&ModashClient> {
        self.modash.as_ref()
    }

    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] when TikTok is disabled.
    pub fn tiktok(&self) -> Result<&TikTokClient, ProviderError> {
        self.tiktok.as_ref().ok_or(ProviderError::NotConfigured {
            provider: Provider::TikTok,
            setting: "TIKTOK_CLIENT_KEY",
        })
    }

    #[must_use]
    pub fn identity(&self) -> Option<&IdentityClient> {
        self.identity.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_leave_providers_unset() {
        let set = ProviderSet::from_config(&ProviderConfig::default()).unwrap();
        assert!(matches!(
            set.ayrshare(),
            Err(ProviderError::NotConfigured { .. })
        ));
        assert!(set.modash_if_configured().is_none());
        assert!(set.identity().is_none());
    }

    #[test]
    fn configured_keys_build_clients() {
        let config = ProviderConfig {
            modash_api_key: Some("m".to_string()),
            tiktok_client_key: Some("ck".to_string()),
            tiktok_client_secret: Some("cs".to_string()),
            ..ProviderConfig::default()
        };
        let set = ProviderSet::from_config(&config).unwrap();
        assert!(set.modash().is_ok());
        assert!(set.tiktok().is_ok());
        assert!(set.ayrshare().is_err());
    }

    #[test]
    fn invalid_base_url_is_fatal() {
        let config = ProviderConfig {
            modash_api_key: Some("m".to_string()),
            modash_base_url: "::not a url::".to_string(),
            ..ProviderConfig::default()
        };
        assert!(ProviderSet::from_config(&config).is_err());
    }
}
