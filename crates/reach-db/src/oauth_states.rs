//! Pending OAuth `state` values (`oauth_states`).

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{CredentialProvider, DbError};

/// Records `state` as issued to `owner_user_id` until `expires_at`.
///
/// Expired states left behind by the same owner and provider are cleared in
/// the same transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn save_oauth_state(
    pool: &PgPool,
    owner_user_id: Uuid,
    provider: CredentialProvider,
    state: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "DELETE FROM oauth_states \
         WHERE owner_user_id = $1 AND provider = $2 AND expires_at <= NOW()",
    )
    .bind(owner_user_id)
    .bind(provider.as_str())
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO oauth_states (owner_user_id, provider, state, expires_at) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(owner_user_id)
    .bind(provider.as_str())
    .bind(state)
    .bind(expires_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Consumes `state` for `owner_user_id`.
///
/// Returns `true` only if the state was issued to this owner and provider and
/// had not expired at `now`. A state can be taken at most once.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn take_oauth_state(
    pool: &PgPool,
    owner_user_id: Uuid,
    provider: CredentialProvider,
    state: &str,
    now: DateTime<Utc>,
) -> Result<bool, DbError> {
    let expires_at: Option<DateTime<Utc>> = sqlx::query_scalar(
        "DELETE FROM oauth_states \
         WHERE owner_user_id = $1 AND provider = $2 AND state = $3 \
         RETURNING expires_at",
    )
    .bind(owner_user_id)
    .bind(provider.as_str())
    .bind(state)
    .fetch_optional(pool)
    .await?;

    Ok(expires_at.is_some_and(|at| at > now))
}
