//! Database operations for the `third_party_credentials` table.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Third-party accounts a user can connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialProvider {
    Ayrshare,
    TikTok,
    Meta,
}

impl CredentialProvider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CredentialProvider::Ayrshare => "ayrshare",
            CredentialProvider::TikTok => "tiktok",
            CredentialProvider::Meta => "meta",
        }
    }
}

impl std::fmt::Display for CredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialProvider {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ayrshare" => Ok(CredentialProvider::Ayrshare),
            "tiktok" => Ok(CredentialProvider::TikTok),
            "meta" => Ok(CredentialProvider::Meta),
            other => Err(DbError::InvalidRow(format!("credential provider '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `third_party_credentials` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CredentialRow {
    pub id: i64,
    pub owner_user_id: Uuid,
    pub provider: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub profile_key: Option<String>,
    pub advertiser_id: Option<String>,
    pub open_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialRow {
    /// Whether the stored access token has passed its expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Values written by [`upsert_credential`]. Fields left `None` keep the
/// stored value when the row already exists.
#[derive(Debug, Clone, Default)]
pub struct NewCredential<'a> {
    pub access_token: Option<&'a str>,
    pub refresh_token: Option<&'a str>,
    pub profile_key: Option<&'a str>,
    pub advertiser_id: Option<&'a str>,
    pub open_id: Option<&'a str>,
    pub expires_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns the caller's credential for `provider`, or `None` if not connected.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_credential(
    pool: &PgPool,
    owner_user_id: Uuid,
    provider: CredentialProvider,
) -> Result<Option<CredentialRow>, DbError> {
    let row = sqlx::query_as::<_, CredentialRow>(
        "SELECT id, owner_user_id, provider, access_token, refresh_token, profile_key, \
                advertiser_id, open_id, expires_at, created_at, updated_at \
         FROM third_party_credentials \
         WHERE owner_user_id = $1 AND provider = $2",
    )
    .bind(owner_user_id)
    .bind(provider.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Creates or updates the caller's credential for `provider`.
///
/// Conflicts on `(owner_user_id, provider)` coalesce each column with the
/// stored value and bump `updated_at`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_credential(
    pool: &PgPool,
    owner_user_id: Uuid,
    provider: CredentialProvider,
    credential: &NewCredential<'_>,
) -> Result<CredentialRow, DbError> {
    let row = sqlx::query_as::<_, CredentialRow>(
        "INSERT INTO third_party_credentials \
             (owner_user_id, provider, access_token, refresh_token, profile_key, \
              advertiser_id, open_id, expires_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (owner_user_id, provider) DO UPDATE SET \
             access_token  = COALESCE(EXCLUDED.access_token, third_party_credentials.access_token), \
             refresh_token = COALESCE(EXCLUDED.refresh_token, third_party_credentials.refresh_token), \
             profile_key   = COALESCE(EXCLUDED.profile_key, third_party_credentials.profile_key), \
             advertiser_id = COALESCE(EXCLUDED.advertiser_id, third_party_credentials.advertiser_id), \
             open_id       = COALESCE(EXCLUDED.open_id, third_party_credentials.open_id), \
             expires_at    = COALESCE(EXCLUDED.expires_at, third_party_credentials.expires_at), \
             updated_at    = NOW() \
         RETURNING id, owner_user_id, provider, access_token, refresh_token, profile_key, \
                   advertiser_id, open_id, expires_at, created_at, updated_at",
    )
    .bind(owner_user_id)
    .bind(provider.as_str())
    .bind(credential.access_token)
    .bind(credential.refresh_token)
    .bind(credential.profile_key)
    .bind(credential.advertiser_id)
    .bind(credential.open_id)
    .bind(credential.expires_at)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Deletes the caller's credential for `provider`.
///
/// Returns `true` if a row was removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_credential(
    pool: &PgPool,
    owner_user_id: Uuid,
    provider: CredentialProvider,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "DELETE FROM third_party_credentials \
         WHERE owner_user_id = $1 AND provider = $2",
    )
    .bind(owner_user_id)
    .bind(provider.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
