use chrono::Utc;
use reach_core::{DictionaryEntry, DictionaryKey};
use serde_json::Value;

use super::ModashClient;
use crate::error::ProviderError;
use crate::normalize::FieldAliases;

const ENTRY_ID: FieldAliases = FieldAliases(&["id", "code"]);
const ENTRY_NAME: FieldAliases = FieldAliases(&["name", "title"]);
const ENTRY_TYPE: FieldAliases = FieldAliases(&["type"]);

impl ModashClient {
    /// Fetches dictionary entries matching `key` from the vendor.
    ///
    /// Entries come back stamped with the current time; rows without an id
    /// or name are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Vendor`] on a non-2xx response.
    pub async fn fetch_dictionary(
        &self,
        key: &DictionaryKey,
    ) -> Result<Vec<DictionaryEntry>, ProviderError> {
        let path = format!("{}/{}", key.platform.as_str(), key.kind.collection());
        let limit = key.limit.to_string();
        let mut query = vec![("limit", limit.as_str())];
        if let Some(q) = &key.query {
            query.push(("query", q.as_str()));
        }

        let raw = self.http.get_json(&path, &query, None).await?;
        let entries = dictionary_entries(&raw, key);
        tracing::debug!(
            platform = %key.platform,
            kind = %key.kind,
            count = entries.len(),
            "fetched dictionary entries from vendor"
        );
        Ok(entries)
    }
}

/// Reads entries from either a bare array or the `<collection>` field.
fn dictionary_entries(raw: &Value, key: &DictionaryKey) -> Vec<DictionaryEntry> {
    let items = raw
        .as_array()
        .or_else(|| raw.get(key.kind.collection()).and_then(Value::as_array))
        .or_else(|| raw.get("data").and_then(Value::as_array));
    let now = Utc::now();

    items
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    Some(DictionaryEntry {
                        platform: key.platform,
                        kind: key.kind,
                        entry_id: ENTRY_ID.str(item)?,
                        name: ENTRY_NAME.str(item)?,
                        entry_type: ENTRY_TYPE.str(item),
                        updated_at: now,
                    })
                })
                .take(key.limit as usize)
                .collect()
        })
        .unwrap_or_default()
}
