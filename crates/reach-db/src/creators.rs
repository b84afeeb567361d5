//! Database operations for the `creator_profiles` table.

use reach_core::CreatorProfile;
use sqlx::PgPool;

use crate::{to_i64, DbError};

/// Upserts a normalized creator profile.
///
/// Conflicts on `(platform, external_user_id)` overwrite every stored
/// attribute except the audience fields, which keep their previous value
/// when the incoming profile has none (lookups rarely carry them).
///
/// Returns the internal `id` of the upserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_creator_profile(
    pool: &PgPool,
    profile: &CreatorProfile,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO creator_profiles \
             (platform, external_user_id, username, display_name, avatar_url, follower_count, \
              following_count, post_count, engagement_rate, avg_likes, avg_views, verified, bio, \
              top_audience_country, top_audience_city) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
         ON CONFLICT (platform, external_user_id) DO UPDATE SET \
             username             = EXCLUDED.username, \
             display_name         = EXCLUDED.display_name, \
             avatar_url           = EXCLUDED.avatar_url, \
             follower_count       = EXCLUDED.follower_count, \
             following_count      = EXCLUDED.following_count, \
             post_count           = EXCLUDED.post_count, \
             engagement_rate      = EXCLUDED.engagement_rate, \
             avg_likes            = EXCLUDED.avg_likes, \
             avg_views            = EXCLUDED.avg_views, \
             verified             = EXCLUDED.verified, \
             bio                  = EXCLUDED.bio, \
             top_audience_country = COALESCE(EXCLUDED.top_audience_country, creator_profiles.top_audience_country), \
             top_audience_city    = COALESCE(EXCLUDED.top_audience_city, creator_profiles.top_audience_city), \
             updated_at           = NOW() \
         RETURNING id",
    )
    .bind(profile.platform.as_str())
    .bind(&profile.external_user_id)
    .bind(&profile.username)
    .bind(&profile.display_name)
    .bind(&profile.avatar_url)
    .bind(to_i64(profile.follower_count))
    .bind(profile.following_count.map(to_i64))
    .bind(profile.post_count.map(to_i64))
    .bind(profile.engagement_rate())
    .bind(profile.avg_likes)
    .bind(profile.avg_views)
    .bind(profile.verified)
    .bind(&profile.bio)
    .bind(&profile.top_audience_country)
    .bind(&profile.top_audience_city)
    .fetch_one(pool)
    .await?;

    Ok(id)
}
