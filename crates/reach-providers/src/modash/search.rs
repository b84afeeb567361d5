use reach_core::{CreatorProfile, FollowerTier, Platform};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::ModashClient;
use crate::error::ProviderError;
use crate::normalize::{as_f64, engagement_fraction, FieldAliases, ProfileAdapter};

/// Credits assumed for a search when the vendor does not report a cost.
pub const DEFAULT_ESTIMATED_CREDITS: f64 = 0.15;
/// Modash returns fixed-size pages.
pub const DEFAULT_PAGE_SIZE: u32 = 15;

const HITS: FieldAliases = FieldAliases(&["data", "directs"]);
const LOOKALIKES: FieldAliases = FieldAliases(&["lookalikes"]);
const TOTAL: FieldAliases = FieldAliases(&["total"]);
const ESTIMATED_CREDITS: FieldAliases = FieldAliases(&["estimatedCredits"]);
const ACTUAL_CREDITS: FieldAliases = FieldAliases(&["creditsUsed", "credits"]);

const ID: FieldAliases = FieldAliases(&["userId", "profile.userId"]);
const USERNAME: FieldAliases = FieldAliases(&["profile.username", "username", "profile.handle"]);
const DISPLAY_NAME: FieldAliases = FieldAliases(&["profile.fullname", "profile.fullName", "fullname"]);
const AVATAR: FieldAliases = FieldAliases(&["profile.picture", "picture"]);
const FOLLOWERS: FieldAliases = FieldAliases(&["profile.followers", "followers"]);
const ENGAGEMENT: FieldAliases = FieldAliases(&["profile.engagementRate", "engagementRate"]);
const AVG_LIKES: FieldAliases = FieldAliases(&["profile.avgLikes", "profile.engagements"]);
const AVG_VIEWS: FieldAliases =
    FieldAliases(&["profile.averageViews", "profile.avgViews", "averageViews"]);
const VERIFIED: FieldAliases = FieldAliases(&["profile.isVerified", "isVerified"]);
const AUDIENCE: FieldAliases = FieldAliases(&["match.audience", "audience"]);

/// One audience breakdown and the entry fields that label it.
struct Breakdown {
    keys: FieldAliases,
    label: FieldAliases,
    title_case: bool,
}

const GENDERS: Breakdown = Breakdown {
    keys: FieldAliases(&["genders"]),
    label: FieldAliases(&["code", "name"]),
    title_case: true,
};
const COUNTRIES: Breakdown = Breakdown {
    keys: FieldAliases(&["geoCountries", "countries"]),
    label: FieldAliases(&["code", "name"]),
    title_case: false,
};
const CITIES: Breakdown = Breakdown {
    keys: FieldAliases(&["geoCities", "cities"]),
    label: FieldAliases(&["name", "code"]),
    title_case: false,
};
const AGES: Breakdown = Breakdown {
    keys: FieldAliases(&["ages"]),
    label: FieldAliases(&["code", "name"]),
    title_case: false,
};
const LANGUAGES: Breakdown = Breakdown {
    keys: FieldAliases(&["languages"]),
    label: FieldAliases(&["name", "code"]),
    title_case: false,
};

const BADGE_ORDER: [&Breakdown; 5] = [&GENDERS, &COUNTRIES, &CITIES, &AGES, &LANGUAGES];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    pub page_size: Option<u32>,
}

/// Body accepted by the search endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub platform: Option<Platform>,
    #[serde(default)]
    pub pagination: Pagination,
    pub sort: Option<Value>,
    #[serde(default)]
    pub filters: Value,
}

impl SearchRequest {
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform.unwrap_or(Platform::Instagram)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorResult {
    pub profile: CreatorProfile,
    pub tier: FollowerTier,
    pub match_badges: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMeta {
    pub estimated_credits: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_credits: Option<f64>,
    pub exact_match: bool,
    pub platform: Platform,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub results: Vec<CreatorResult>,
    pub lookalikes: Vec<CreatorResult>,
    pub meta: SearchMeta,
}

impl SearchResponse {
    /// Normalizes a raw vendor search response for `request`.
    #[must_use]
    pub fn from_vendor(raw: &Value, request: &SearchRequest) -> Self {
        let platform = request.platform();
        let adapter = ModashAdapter::new(platform);
        let results = creator_results(HITS.value(raw), &adapter);
        let lookalikes = creator_results(LOOKALIKES.value(raw), &adapter);
        let total = TOTAL.u64(raw).unwrap_or(results.len() as u64);

        Self {
            page: request.pagination.page,
            page_size: request.pagination.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            total,
            meta: SearchMeta {
                estimated_credits: ESTIMATED_CREDITS
                    .f64(raw)
                    .unwrap_or(DEFAULT_ESTIMATED_CREDITS),
                actual_credits: ACTUAL_CREDITS.f64(raw),
                exact_match: !results.is_empty(),
                platform,
            },
            results,
            lookalikes,
        }
    }
}

fn creator_results(items: Option<&Value>, adapter: &ModashAdapter) -> Vec<CreatorResult> {
    items
        .and_then(Value::as_array)
        .map(|hits| {
            hits.iter()
                .map(|hit| {
                    let profile = adapter.normalize(hit);
                    CreatorResult {
                        tier: profile.tier(),
                        match_badges: match_badges(hit),
                        profile,
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Highest-weighted entry of a breakdown array, as `(label, weight)`.
fn top_entry(entries: &Value, breakdown: &Breakdown) -> Option<(String, f64)> {
    entries
        .as_array()?
        .iter()
        .filter_map(|entry| {
            let label = breakdown.label.str(entry)?;
            let weight = entry.get("weight").and_then(as_f64)?;
            Some((label, weight))
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(label, weight)| {
            let label = if breakdown.title_case {
                title_case(&label)
            } else {
                label
            };
            (label, weight)
        })
}

fn title_case(value: &str) -> String {
    let lower = value.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Human-readable badges such as `"Female • 62%"` from the hit's audience
/// match breakdowns: one badge per breakdown, for its top-weighted entry.
#[must_use]
pub fn match_badges(hit: &Value) -> Vec<String> {
    let Some(audience) = AUDIENCE.value(hit) else {
        return Vec::new();
    };
    BADGE_ORDER
        .iter()
        .filter_map(|breakdown| {
            let entries = breakdown.keys.value(audience)?;
            let (label, weight) = top_entry(entries, breakdown)?;
            let pct = if weight <= 1.0 { weight * 100.0 } else { weight };
            Some(format!("{label} • {}%", pct.round()))
        })
        .collect()
}

/// Normalizes one Modash search hit.
#[derive(Debug, Clone, Copy)]
pub struct ModashAdapter {
    platform: Platform,
}

impl ModashAdapter {
    #[must_use]
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }
}

impl ProfileAdapter for ModashAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn normalize(&self, raw: &Value) -> CreatorProfile {
        let username = USERNAME.str(raw).unwrap_or_default();
        let id = ID.str(raw).unwrap_or_else(|| username.clone());
        let mut profile = CreatorProfile::new(self.platform, id, username);
        profile.display_name = DISPLAY_NAME.str(raw);
        profile.avatar_url = AVATAR.str(raw);
        profile.follower_count = FOLLOWERS.u64(raw).unwrap_or(0);
        profile.avg_likes = AVG_LIKES.f64(raw);
        profile.avg_views = AVG_VIEWS.f64(raw);
        profile.verified = VERIFIED.bool(raw).unwrap_or(false);
        profile.set_engagement_rate(ENGAGEMENT.f64(raw).map_or(0.0, engagement_fraction));

        if let Some(audience) = AUDIENCE.value(raw) {
            profile.top_audience_country = COUNTRIES
                .keys
                .value(audience)
                .and_then(|e| top_entry(e, &COUNTRIES))
                .map(|(label, _)| label);
            profile.top_audience_city = CITIES
                .keys
                .value(audience)
                .and_then(|e| top_entry(e, &CITIES))
                .map(|(label, _)| label);
        }
        profile
    }
}

impl ModashClient {
    /// Runs an influencer search on the request's platform.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::InvalidRequest`] for a platform Modash does not index.
    /// - [`ProviderError::Vendor`] on a non-2xx response.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ProviderError> {
        let platform = request.platform();
        if !platform.is_discoverable() {
            return Err(ProviderError::InvalidRequest(format!(
                "search is not available for {platform}"
            )));
        }

        let filter = if request.filters.is_null() {
            json!({})
        } else {
            request.filters.clone()
        };
        let mut body = json!({
            "page": request.pagination.page,
            "filter": filter,
        });
        if let Some(sort) = &request.sort {
            body["sort"] = sort.clone();
        }

        let path = format!("{}/search", platform.as_str());
        let raw = self.http.post_json(&path, &body, None).await?;
        Ok(SearchResponse::from_vendor(&raw, request))
    }
}
