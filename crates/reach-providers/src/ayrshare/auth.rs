use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::AyrshareClient;
use crate::error::ProviderError;
use crate::normalize::FieldAliases;

const SOCIAL_LINK_URL: &str = "https://profile.ayrshare.com";

/// A user profile created under the business account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedProfile {
    pub profile_key: String,
    #[serde(default)]
    pub ref_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Single-use token for the hosted social-linking page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwtGrant {
    pub token: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthUrl {
    pub url: String,
    pub jwt: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStatus {
    pub connected: bool,
    pub active_social_accounts: Vec<String>,
    pub display_names: Vec<Value>,
}

const ACTIVE_ACCOUNTS: FieldAliases = FieldAliases(&["activeSocialAccounts", "platforms"]);
const DISPLAY_NAMES: FieldAliases = FieldAliases(&["displayNames"]);

impl AyrshareClient {
    /// Creates a user profile titled `title`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Vendor`] on a non-2xx response, or
    /// [`ProviderError::Deserialize`] if the response lacks a `profileKey`.
    pub async fn create_profile(&self, title: &str) -> Result<CreatedProfile, ProviderError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ProviderError::InvalidRequest(
                "title is required".to_string(),
            ));
        }
        let raw = self
            .http
            .post_json("profiles/profile", &json!({ "title": title }), None)
            .await?;
        serde_json::from_value(raw).map_err(|e| ProviderError::Deserialize {
            context: "create_profile".to_string(),
            source: e,
        })
    }

    /// Signs a JWT for `profile_key` with the business private key.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] when the private key or domain
    /// is missing, or a vendor/deserialize error.
    pub async fn generate_jwt(
        &self,
        profile_key: &str,
        redirect: Option<&str>,
    ) -> Result<JwtGrant, ProviderError> {
        let mut body = json!({
            "domain": self.domain()?,
            "privateKey": self.private_key()?,
            "profileKey": profile_key,
        });
        if let Some(redirect) = redirect {
            body["redirect"] = Value::String(redirect.to_string());
        }
        let raw = self
            .http
            .post_json("profiles/generateJWT", &body, None)
            .await?;
        serde_json::from_value(raw).map_err(|e| ProviderError::Deserialize {
            context: "generate_jwt".to_string(),
            source: e,
        })
    }

    /// Returns the social-linking URL for `profile_key`.
    ///
    /// Uses the URL Ayrshare returns with the JWT; when absent, builds the
    /// hosted page URL from the domain and token.
    ///
    /// # Errors
    ///
    /// See [`AyrshareClient::generate_jwt`].
    pub async fn get_auth_url(
        &self,
        profile_key: &str,
        redirect: Option<&str>,
    ) -> Result<AuthUrl, ProviderError> {
        let grant = self.generate_jwt(profile_key, redirect).await?;
        let url = match grant.url {
            Some(url) => url,
            None => Url::parse_with_params(
                SOCIAL_LINK_URL,
                &[("domain", self.domain()?), ("jwt", grant.token.as_str())],
            )
            .map_err(|e| ProviderError::InvalidUrl {
                url: SOCIAL_LINK_URL.to_string(),
                reason: e.to_string(),
            })?
            .to_string(),
        };
        Ok(AuthUrl {
            url,
            jwt: grant.token,
            timestamp: Utc::now(),
        })
    }

    /// Lists every user profile under the business account.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Vendor`] on a non-2xx response.
    pub async fn get_profiles(&self) -> Result<Value, ProviderError> {
        self.http.get_json("profiles", &[], None).await
    }

    /// Reports which social accounts are linked to `profile_key`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Vendor`] on a non-2xx response.
    pub async fn get_profile_status(
        &self,
        profile_key: &str,
    ) -> Result<ProfileStatus, ProviderError> {
        let raw = self.http.get_json("user", &[], Some(profile_key)).await?;
        let active_social_accounts: Vec<String> = ACTIVE_ACCOUNTS
            .value(&raw)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        let display_names = DISPLAY_NAMES
            .value(&raw)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(ProfileStatus {
            connected: !active_social_accounts.is_empty(),
            active_social_accounts,
            display_names,
        })
    }

    /// Unlinks one social network from `profile_key`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Vendor`] on a non-2xx response.
    pub async fn unlink_social(
        &self,
        profile_key: &str,
        platform: &str,
    ) -> Result<Value, ProviderError> {
        self.http
            .delete_json(
                "profiles/social",
                &json!({ "platform": platform }),
                Some(profile_key),
            )
            .await
    }

    /// Deletes the user profile behind `profile_key`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Vendor`] on a non-2xx response.
    pub async fn delete_profile(&self, profile_key: &str) -> Result<Value, ProviderError> {
        self.http
            .delete_json(
                "profiles/profile",
                &json!({ "profileKey": profile_key }),
                Some(profile_key),
            )
            .await
    }
}
