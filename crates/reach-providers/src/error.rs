use thiserror::Error;

use crate::http::Provider;

/// Errors returned by the third-party API clients.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network, TLS or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The vendor answered with a status outside 200–299.
    #[error("{provider} returned HTTP {status}: {body}")]
    Vendor {
        provider: Provider,
        status: u16,
        body: String,
    },

    /// The response body could not be decoded into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A credential or setting required by this provider is not configured.
    #[error("{provider} is not configured: missing {setting}")]
    NotConfigured {
        provider: Provider,
        setting: &'static str,
    },

    /// The caller has no stored credential for this provider.
    #[error("no connected {provider} account")]
    NotConnected { provider: Provider },

    /// The vendor payload did not include data for the requested platform.
    #[error("no data found for platform {platform}")]
    NotFound { platform: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The request was rejected before reaching the vendor.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// HTTP status the server should answer with for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            ProviderError::Vendor { status, .. } => match *status {
                400 | 401 | 403 | 404 | 429 => *status,
                _ => 500,
            },
            ProviderError::NotConnected { .. } | ProviderError::InvalidRequest(_) => 400,
            ProviderError::NotFound { .. } => 404,
            ProviderError::Http(_)
            | ProviderError::Deserialize { .. }
            | ProviderError::NotConfigured { .. }
            | ProviderError::InvalidUrl { .. } => 500,
        }
    }

    /// End-user guidance for this failure, distinct per category.
    #[must_use]
    pub fn user_help(&self) -> Option<String> {
        let help = match self {
            ProviderError::Vendor {
                provider,
                status,
                body,
            } => match *status {
                403 if body.contains("API Key not valid") => format!(
                    "The {provider} API key was rejected. Ask an administrator to check the key configured for this environment."
                ),
                401 | 403 => format!(
                    "{provider} rejected the request credentials. Reconnect your account or check that it has the required permissions."
                ),
                404 => "Profile not found. Check the username and platform, then try again."
                    .to_string(),
                429 => format!(
                    "{provider} rate limit reached. Wait a minute before trying again."
                ),
                400 => format!(
                    "{provider} could not process this request. Check the submitted values."
                ),
                _ => format!("{provider} returned an unexpected error. Try again later."),
            },
            ProviderError::NotConnected { provider } => format!(
                "Your {provider} account is not connected. Connect it from the integrations page, then try again."
            ),
            ProviderError::NotFound { platform } => format!(
                "No data found for {platform}. The account may be private, unlinked, or not exist."
            ),
            ProviderError::NotConfigured { provider, .. } => format!(
                "The {provider} integration is not configured on this server."
            ),
            ProviderError::Http(_) => {
                "The upstream service could not be reached. Try again later.".to_string()
            }
            ProviderError::InvalidRequest(_)
            | ProviderError::Deserialize { .. }
            | ProviderError::InvalidUrl { .. } => return None,
        };
        Some(help)
    }
}
