//! Shared plumbing for mapping vendor JSON onto [`CreatorProfile`].
//!
//! Vendors name the same concept differently across endpoints and payload
//! versions. Each adapter declares, per field, an ordered list of accepted
//! names in a [`FieldAliases`]; the first alias present with a non-null value
//! wins. Aliases containing `.` address nested objects (`stats.followers`).

use reach_core::{CreatorProfile, Platform};
use serde_json::Value;

/// Converts one vendor profile payload into a [`CreatorProfile`].
///
/// Normalization never fails: missing or malformed numeric fields become
/// zero or `None`.
pub trait ProfileAdapter {
    fn platform(&self) -> Platform;

    fn normalize(&self, raw: &Value) -> CreatorProfile;
}

/// Ordered vendor field names for one concept.
#[derive(Debug, Clone, Copy)]
pub struct FieldAliases(pub &'static [&'static str]);

impl FieldAliases {
    #[must_use]
    pub fn names(&self) -> &'static [&'static str] {
        self.0
    }

    /// First alias present in `raw` with a non-null value.
    #[must_use]
    pub fn value<'a>(&self, raw: &'a Value) -> Option<&'a Value> {
        self.0
            .iter()
            .filter_map(|alias| lookup(raw, alias))
            .find(|v| !v.is_null())
    }

    /// String value; numbers are rendered, blank strings skipped.
    #[must_use]
    pub fn str(&self, raw: &Value) -> Option<String> {
        self.0
            .iter()
            .filter_map(|alias| lookup(raw, alias))
            .find_map(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }

    /// Non-negative integer; accepts floats (truncated) and numeric strings.
    #[must_use]
    pub fn u64(&self, raw: &Value) -> Option<u64> {
        self.0
            .iter()
            .filter_map(|alias| lookup(raw, alias))
            .find_map(as_u64)
    }

    #[must_use]
    pub fn f64(&self, raw: &Value) -> Option<f64> {
        self.0
            .iter()
            .filter_map(|alias| lookup(raw, alias))
            .find_map(as_f64)
    }

    /// Boolean; accepts `true`/`false`, `"true"`/`"false"` and `0`/`1`.
    #[must_use]
    pub fn bool(&self, raw: &Value) -> Option<bool> {
        self.0
            .iter()
            .filter_map(|alias| lookup(raw, alias))
            .find_map(|v| match v {
                Value::Bool(b) => Some(*b),
                Value::Number(n) => n.as_i64().map(|i| i != 0),
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" | "yes" => Some(true),
                    "false" | "0" | "no" => Some(false),
                    _ => None,
                },
                _ => None,
            })
    }
}

fn lookup<'a>(raw: &'a Value, alias: &str) -> Option<&'a Value> {
    if alias.contains('.') {
        let pointer = format!("/{}", alias.replace('.', "/"));
        raw.pointer(&pointer)
    } else {
        raw.get(alias)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => {
            let s = s.trim().replace(',', "");
            s.parse::<u64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f as u64)
            })
        }
        _ => None,
    }
}

pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

/// Engagement fractions arrive either as `0.034` or as a percentage `3.4`.
/// Values above 1 are treated as percentages.
#[must_use]
pub fn engagement_fraction(value: f64) -> f64 {
    if value > 1.0 {
        value / 100.0
    } else {
        value
    }
}
