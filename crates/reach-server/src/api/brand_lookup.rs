//! `ayrshare-brand-lookup`: public creator profiles by username.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use reach_core::Platform;
use reach_providers::ayrshare::{LookupProfile, LOOKUP_PLATFORMS};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{json_body, parse_payload, persist_profiles, AppState, FunctionError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LookupPayload {
    #[serde(default)]
    username: String,
    platform: Option<String>,
    search_type: Option<String>,
}

/// Lookup responses carry the first profile at the top level alongside the
/// full list, so single-platform callers need not index into `profiles`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    success: bool,
    profile: Option<LookupProfile>,
    profiles: Vec<LookupProfile>,
    missing: Vec<Platform>,
    source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    search_type: Option<String>,
}

/// `None` means every lookup platform.
fn requested_platforms(platform: Option<&str>) -> Result<Option<Platform>, FunctionError> {
    match platform.map(str::trim) {
        None | Some("" | "all") => Ok(None),
        Some(name) => name
            .parse::<Platform>()
            .map(Some)
            .map_err(|e| FunctionError::bad_request(e.to_string())),
    }
}

pub(super) async fn lookup(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, FunctionError> {
    let payload: LookupPayload = parse_payload(json_body(payload)?)?;

    let username = payload.username.trim().trim_start_matches('@');
    if username.is_empty() {
        return Err(FunctionError::bad_request("username is required"));
    }
    let platform = requested_platforms(payload.platform.as_deref())?;

    let ayrshare = state.providers.ayrshare()?;
    let (profiles, missing) = match platform {
        Some(platform) => (vec![ayrshare.lookup_profile(username, platform).await?], Vec::new()),
        None => {
            let result = ayrshare.lookup_profiles(username, &LOOKUP_PLATFORMS).await?;
            (result.profiles, result.missing)
        }
    };

    let to_persist: Vec<_> = profiles.iter().map(|p| &p.profile).collect();
    persist_profiles(&state.pool, to_persist).await;
    tracing::info!(
        username,
        found = profiles.len(),
        missing = missing.len(),
        "brand lookup complete"
    );

    Ok(Json(LookupResponse {
        success: true,
        profile: profiles.first().cloned(),
        profiles,
        missing,
        source: "ayrshare",
        search_type: payload.search_type,
    })
    .into_response())
}
