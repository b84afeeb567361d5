use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CoreError, Platform};

pub const DEFAULT_DICTIONARY_LIMIT: u32 = 50;
pub const MAX_DICTIONARY_LIMIT: u32 = 200;

/// Lookup tables exposed by the discovery vendor for building search filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DictionaryKind {
    Location,
    Interest,
    Brand,
    Language,
}

impl DictionaryKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DictionaryKind::Location => "location",
            DictionaryKind::Interest => "interest",
            DictionaryKind::Brand => "brand",
            DictionaryKind::Language => "language",
        }
    }

    /// Plural path segment (and response key) used by the vendor endpoint.
    #[must_use]
    pub fn collection(self) -> &'static str {
        match self {
            DictionaryKind::Location => "locations",
            DictionaryKind::Interest => "interests",
            DictionaryKind::Brand => "brands",
            DictionaryKind::Language => "languages",
        }
    }
}

impl std::fmt::Display for DictionaryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DictionaryKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "location" | "locations" => Ok(DictionaryKind::Location),
            "interest" | "interests" => Ok(DictionaryKind::Interest),
            "brand" | "brands" => Ok(DictionaryKind::Brand),
            "language" | "languages" => Ok(DictionaryKind::Language),
            other => Err(CoreError::UnknownDictionaryKind(other.to_string())),
        }
    }
}

/// One cached dictionary row. `(platform, kind, entry_id)` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub platform: Platform,
    pub kind: DictionaryKind,
    pub entry_id: String,
    pub name: String,
    pub entry_type: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Cache key for a dictionary lookup. Each platform has its own dictionaries,
/// so entries are never shared across platforms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DictionaryKey {
    pub platform: Platform,
    pub kind: DictionaryKind,
    pub query: Option<String>,
    pub limit: u32,
}

impl DictionaryKey {
    /// Builds a key, trimming the query (blank means "no filter") and clamping
    /// `limit` to `1..=200`.
    #[must_use]
    pub fn new(
        platform: Platform,
        kind: DictionaryKind,
        query: Option<&str>,
        limit: Option<u32>,
    ) -> Self {
        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(ToOwned::to_owned);
        let limit = limit
            .unwrap_or(DEFAULT_DICTIONARY_LIMIT)
            .clamp(1, MAX_DICTIONARY_LIMIT);
        Self {
            platform,
            kind,
            query,
            limit,
        }
    }

    /// Whether a cached entry belongs to this key's platform and kind.
    #[must_use]
    pub fn owns(&self, entry: &DictionaryEntry) -> bool {
        entry.platform == self.platform && entry.kind == self.kind
    }

    /// Whether `name` satisfies this key's substring filter (case-insensitive).
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.query
            .as_deref()
            .is_none_or(|q| name.to_lowercase().contains(&q.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_singular_and_plural() {
        assert_eq!(
            "locations".parse::<DictionaryKind>().unwrap(),
            DictionaryKind::Location
        );
        assert_eq!(
            "Interest".parse::<DictionaryKind>().unwrap(),
            DictionaryKind::Interest
        );
        assert!("hashtags".parse::<DictionaryKind>().is_err());
    }

    fn key(kind: DictionaryKind, query: Option<&str>, limit: Option<u32>) -> DictionaryKey {
        DictionaryKey::new(Platform::Instagram, kind, query, limit)
    }

    #[test]
    fn key_normalizes_query_and_limit() {
        let k = key(DictionaryKind::Brand, Some("  "), Some(0));
        assert!(k.query.is_none());
        assert_eq!(k.limit, 1);

        let k = key(DictionaryKind::Brand, Some(" Nike "), Some(5_000));
        assert_eq!(k.query.as_deref(), Some("Nike"));
        assert_eq!(k.limit, MAX_DICTIONARY_LIMIT);

        let k = key(DictionaryKind::Brand, None, None);
        assert_eq!(k.limit, DEFAULT_DICTIONARY_LIMIT);
    }

    #[test]
    fn key_matches_substring_case_insensitively() {
        let k = key(DictionaryKind::Location, Some("york"), None);
        assert!(k.matches("New York"));
        assert!(!k.matches("Boston"));
        let unfiltered = key(DictionaryKind::Location, None, None);
        assert!(unfiltered.matches("Anything"));
    }

    #[test]
    fn keys_for_different_platforms_differ_and_own_only_their_entries() {
        let instagram = key(DictionaryKind::Interest, None, None);
        let tiktok = DictionaryKey::new(Platform::TikTok, DictionaryKind::Interest, None, None);
        assert_ne!(instagram, tiktok);

        let entry = DictionaryEntry {
            platform: Platform::TikTok,
            kind: DictionaryKind::Interest,
            entry_id: "1".to_string(),
            name: "Fitness".to_string(),
            entry_type: None,
            updated_at: Utc::now(),
        };
        assert!(tiktok.owns(&entry));
        assert!(!instagram.owns(&entry));
    }
}
