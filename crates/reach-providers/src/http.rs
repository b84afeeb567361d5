//! Authenticated JSON client shared by every vendor integration.
//!
//! [`VendorClient`] owns the `reqwest` client, the provider's base URL and its
//! static bearer token. Requests are built with [`VendorClient::request`],
//! optionally given a per-account `Profile-Key` or a per-user bearer token,
//! and sent with [`VendorRequest::send`], which turns any non-2xx status into
//! [`ProviderError::Vendor`] with the raw body. Nothing is retried.

use std::time::Duration;

use reqwest::{header, Client, Method, RequestBuilder, Url};
use serde::Serialize;
use serde_json::Value;

use crate::error::ProviderError;

/// Header Ayrshare uses to select one of a business account's user profiles.
pub const PROFILE_KEY_HEADER: &str = "Profile-Key";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Ayrshare,
    Modash,
    TikTok,
    Identity,
}

impl Provider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Ayrshare => "ayrshare",
            Provider::Modash => "modash",
            Provider::TikTok => "tiktok",
            Provider::Identity => "identity",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Ayrshare => write!(f, "Ayrshare"),
            Provider::Modash => write!(f, "Modash"),
            Provider::TikTok => write!(f, "TikTok"),
            Provider::Identity => write!(f, "Identity provider"),
        }
    }
}

pub struct VendorClient {
    client: Client,
    provider: Provider,
    base_url: Url,
    bearer_token: Option<String>,
}

impl VendorClient {
    /// Creates a client for `provider` rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`ProviderError::InvalidUrl`] if `base_url` does not parse.
    pub fn new(
        provider: Provider,
        base_url: &str,
        bearer_token: Option<&str>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // A trailing slash makes `Url::join` append to the base path instead of
        // replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ProviderError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            provider,
            base_url,
            bearer_token: bearer_token.map(ToOwned::to_owned),
        })
    }

    #[must_use]
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Resolves `path` (no leading slash) against the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidUrl`] if the joined URL is invalid.
    pub fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ProviderError::InvalidUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })
    }

    /// Starts a request to `path` carrying the provider's bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidUrl`] if `path` cannot be joined.
    pub fn request(&self, method: Method, path: &str) -> Result<VendorRequest<'_>, ProviderError> {
        let url = self.endpoint(path)?;
        let context = format!("{} {}", method, url.path());
        Ok(VendorRequest {
            vendor: self,
            builder: self.client.request(method, url),
            bearer: self.bearer_token.clone(),
            profile_key: None,
            context,
        })
    }

    /// GET `path` with query pairs and decode the JSON body.
    ///
    /// # Errors
    ///
    /// See [`VendorRequest::send`].
    pub async fn get_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
        profile_key: Option<&str>,
    ) -> Result<Value, ProviderError> {
        self.request(Method::GET, path)?
            .query(query)
            .profile_key(profile_key)
            .send()
            .await
    }

    /// POST a JSON body to `path` and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`VendorRequest::send`].
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        profile_key: Option<&str>,
    ) -> Result<Value, ProviderError> {
        self.request(Method::POST, path)?
            .json(body)
            .profile_key(profile_key)
            .send()
            .await
    }

    /// DELETE `path` with a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`VendorRequest::send`].
    pub async fn delete_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        profile_key: Option<&str>,
    ) -> Result<Value, ProviderError> {
        self.request(Method::DELETE, path)?
            .json(body)
            .profile_key(profile_key)
            .send()
            .await
    }
}

/// A request under construction; see [`VendorClient::request`].
pub struct VendorRequest<'a> {
    vendor: &'a VendorClient,
    builder: RequestBuilder,
    bearer: Option<String>,
    profile_key: Option<String>,
    context: String,
}

impl VendorRequest<'_> {
    #[must_use]
    pub fn query<T: Serialize + ?Sized>(mut self, query: &T) -> Self {
        self.builder = self.builder.query(query);
        self
    }

    #[must_use]
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        self.builder = self.builder.json(body);
        self
    }

    #[must_use]
    pub fn form<T: Serialize + ?Sized>(mut self, form: &T) -> Self {
        self.builder = self.builder.form(form);
        self
    }

    #[must_use]
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Replaces the provider token with a per-user access token.
    #[must_use]
    pub fn bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_owned());
        self
    }

    /// Sends no `Authorization` header at all.
    #[must_use]
    pub fn without_bearer(mut self) -> Self {
        self.bearer = None;
        self
    }

    #[must_use]
    pub fn profile_key(mut self, key: Option<&str>) -> Self {
        self.profile_key = key.map(ToOwned::to_owned);
        self
    }

    /// Sends the request and decodes the JSON body.
    ///
    /// An empty 2xx body decodes to `Value::Null`.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::Http`] on network failure.
    /// - [`ProviderError::Vendor`] on a non-2xx status, with the raw body.
    /// - [`ProviderError::Deserialize`] if a 2xx body is not JSON.
    pub async fn send(self) -> Result<Value, ProviderError> {
        let provider = self.vendor.provider;
        let mut builder = self.builder;
        if let Some(token) = &self.bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(key) = &self.profile_key {
            builder = builder.header(PROFILE_KEY_HEADER, key);
        }

        tracing::debug!(provider = provider.as_str(), request = %self.context, "vendor request");
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                provider = provider.as_str(),
                request = %self.context,
                status = status.as_u16(),
                "vendor returned non-success status"
            );
            return Err(ProviderError::Vendor {
                provider,
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| ProviderError::Deserialize {
            context: self.context,
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> VendorClient {
        VendorClient::new(Provider::Modash, base, Some("k"), 5, "reach-test/0.1")
            .expect("client construction should not fail")
    }

    #[test]
    fn endpoint_appends_to_base_path() {
        let c = client("https://api.modash.io/v1");
        assert_eq!(
            c.endpoint("instagram/search").unwrap().as_str(),
            "https://api.modash.io/v1/instagram/search"
        );
    }

    #[test]
    fn endpoint_tolerates_slashes_on_both_sides() {
        let c = client("https://api.ayrshare.com/api/");
        assert_eq!(
            c.endpoint("/profiles/generateJWT").unwrap().as_str(),
            "https://api.ayrshare.com/api/profiles/generateJWT"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = VendorClient::new(Provider::TikTok, "not a url", None, 5, "ua");
        assert!(matches!(result, Err(ProviderError::InvalidUrl { .. })));
    }
}
