//! Postgres-backed dictionary cache (`dictionary_entries`).

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use reach_core::{CacheStore, DictionaryEntry, DictionaryKey, DictionaryKind, Platform};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `dictionary_entries` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DictionaryRow {
    pub platform: String,
    pub kind: String,
    pub entry_id: String,
    pub name: String,
    pub entry_type: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DictionaryRow> for DictionaryEntry {
    type Error = DbError;

    fn try_from(row: DictionaryRow) -> Result<Self, Self::Error> {
        let platform: Platform = row.platform.parse().map_err(|_| {
            DbError::InvalidRow(format!("dictionary platform '{}'", row.platform))
        })?;
        let kind: DictionaryKind = row
            .kind
            .parse()
            .map_err(|_| DbError::InvalidRow(format!("dictionary kind '{}'", row.kind)))?;
        Ok(DictionaryEntry {
            platform,
            kind,
            entry_id: row.entry_id,
            name: row.name,
            entry_type: row.entry_type,
            updated_at: row.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Escapes `LIKE` metacharacters so the query is matched literally.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Returns entries for `key.platform` and `key.kind` updated after `fresh_since`, filtered by a
/// case-insensitive substring on `name` when the key carries a query.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::InvalidRow`]
/// if a stored platform or kind no longer parses.
pub async fn list_fresh_dictionary_entries(
    pool: &PgPool,
    key: &DictionaryKey,
    fresh_since: DateTime<Utc>,
) -> Result<Vec<DictionaryEntry>, DbError> {
    let pattern = key.query.as_deref().map(escape_like);

    let rows = sqlx::query_as::<_, DictionaryRow>(
        "SELECT platform, kind, entry_id, name, entry_type, updated_at \
         FROM dictionary_entries \
         WHERE platform = $1 \
           AND kind = $2 \
           AND updated_at > $3 \
           AND ($4::text IS NULL OR name ILIKE '%' || $4 || '%') \
         ORDER BY name \
         LIMIT $5",
    )
    .bind(key.platform.as_str())
    .bind(key.kind.as_str())
    .bind(fresh_since)
    .bind(pattern)
    .bind(i64::from(key.limit))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(DictionaryEntry::try_from).collect()
}

/// Upserts `entries` in one round-trip, stamping every row with `fetched_at`.
///
/// Duplicate `(platform, kind, entry_id)` triples within the batch keep the first
/// occurrence; Postgres rejects an `ON CONFLICT DO UPDATE` that touches the
/// same row twice.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_dictionary_entries(
    pool: &PgPool,
    entries: &[DictionaryEntry],
    fetched_at: DateTime<Utc>,
) -> Result<u64, DbError> {
    if entries.is_empty() {
        return Ok(0);
    }

    let mut seen = HashSet::with_capacity(entries.len());
    let mut platforms: Vec<&str> = Vec::with_capacity(entries.len());
    let mut kinds: Vec<&str> = Vec::with_capacity(entries.len());
    let mut entry_ids: Vec<String> = Vec::with_capacity(entries.len());
    let mut names: Vec<String> = Vec::with_capacity(entries.len());
    let mut entry_types: Vec<Option<String>> = Vec::with_capacity(entries.len());

    for entry in entries {
        if !seen.insert((entry.platform, entry.kind, entry.entry_id.as_str())) {
            continue;
        }
        platforms.push(entry.platform.as_str());
        kinds.push(entry.kind.as_str());
        entry_ids.push(entry.entry_id.clone());
        names.push(entry.name.clone());
        entry_types.push(entry.entry_type.clone());
    }

    let result = sqlx::query(
        "INSERT INTO dictionary_entries \
             (platform, kind, entry_id, name, entry_type, updated_at) \
         SELECT e.platform, e.kind, e.entry_id, e.name, e.entry_type, $6 \
         FROM UNNEST($1::text[], $2::text[], $3::text[], $4::text[], $5::text[]) \
              AS e(platform, kind, entry_id, name, entry_type) \
         ON CONFLICT (platform, kind, entry_id) DO UPDATE SET \
             name       = EXCLUDED.name, \
             entry_type = EXCLUDED.entry_type, \
             updated_at = EXCLUDED.updated_at",
    )
    .bind(&platforms)
    .bind(&kinds)
    .bind(&entry_ids)
    .bind(&names)
    .bind(&entry_types)
    .bind(fetched_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

// ---------------------------------------------------------------------------
// Cache store
// ---------------------------------------------------------------------------

/// [`CacheStore`] over `dictionary_entries`, used behind a
/// [`reach_core::CachedLookup`].
#[derive(Debug, Clone)]
pub struct PgDictionaryStore {
    pool: PgPool,
}

impl PgDictionaryStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CacheStore<DictionaryKey, DictionaryEntry> for PgDictionaryStore {
    type Error = DbError;

    async fn load_fresh(
        &self,
        key: &DictionaryKey,
        fresh_since: DateTime<Utc>,
    ) -> Result<Vec<DictionaryEntry>, DbError> {
        list_fresh_dictionary_entries(&self.pool, key, fresh_since).await
    }

    async fn store(
        &self,
        key: &DictionaryKey,
        values: &[DictionaryEntry],
        fetched_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let written = upsert_dictionary_entries(&self.pool, values, fetched_at).await?;
        tracing::debug!(
            platform = %key.platform,
            kind = %key.kind,
            written,
            "dictionary cache refreshed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_escapes_metacharacters() {
        assert_eq!(escape_like("100%_pure\\"), "100\\%\\_pure\\\\");
        assert_eq!(escape_like("york"), "york");
    }

    #[test]
    fn row_with_unknown_kind_is_invalid() {
        let row = DictionaryRow {
            platform: "instagram".to_string(),
            kind: "hashtag".to_string(),
            entry_id: "1".to_string(),
            name: "x".to_string(),
            entry_type: None,
            updated_at: Utc::now(),
        };
        let err = DictionaryEntry::try_from(row).unwrap_err();
        assert!(matches!(err, DbError::InvalidRow(_)));
    }

    #[test]
    fn row_with_unknown_platform_is_invalid() {
        let row = DictionaryRow {
            platform: "myspace".to_string(),
            kind: "brand".to_string(),
            entry_id: "1".to_string(),
            name: "x".to_string(),
            entry_type: None,
            updated_at: Utc::now(),
        };
        let err = DictionaryEntry::try_from(row).unwrap_err();
        assert!(matches!(err, DbError::InvalidRow(ref m) if m.contains("platform")));
    }
}
