//! `ayrshare-auth`: user profile creation and the social-linking flow.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use reach_db::{CredentialProvider, CredentialRow, NewCredential};
use reach_providers::{Provider, ProviderError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::middleware::Caller;

use super::{
    json_body, parse_action, resolve_profile_key, success, ActionSet, AppState, FunctionError,
};

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(super) enum AyrshareAuthAction {
    CreateProfile(CreateProfilePayload),
    GenerateJwt(ProfileRef),
    GetAuthUrl(ProfileRef),
    GetProfiles {},
    GetProfileStatus(ProfileRef),
    UnlinkProfile(UnlinkPayload),
}

impl ActionSet for AyrshareAuthAction {
    const NAMES: &'static [&'static str] = &[
        "create_profile",
        "generate_jwt",
        "get_auth_url",
        "get_profiles",
        "get_profile_status",
        "unlink_profile",
    ];
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateProfilePayload {
    title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProfileRef {
    profile_key: Option<String>,
    redirect: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UnlinkPayload {
    profile_key: Option<String>,
    /// Social network to unlink; without one the whole profile is deleted.
    platform: Option<String>,
}

#[derive(Debug, Serialize)]
struct JwtData {
    token: String,
    jwt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

pub(super) async fn dispatch(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, FunctionError> {
    let action: AyrshareAuthAction = parse_action(json_body(payload)?)?;

    match action {
        AyrshareAuthAction::CreateProfile(p) => create_profile(&state, &caller, &p.title).await,
        AyrshareAuthAction::GenerateJwt(p) => {
            let key = resolve_profile_key(&state, &caller, p.profile_key).await?;
            let grant = state
                .providers
                .ayrshare()?
                .generate_jwt(&key, p.redirect.as_deref())
                .await?;
            Ok(success(JwtData {
                jwt: grant.token.clone(),
                token: grant.token,
                url: grant.url,
            })
            .into_response())
        }
        AyrshareAuthAction::GetAuthUrl(p) => {
            let key = resolve_profile_key(&state, &caller, p.profile_key).await?;
            let auth = state
                .providers
                .ayrshare()?
                .get_auth_url(&key, p.redirect.as_deref())
                .await?;
            Ok(success(auth).into_response())
        }
        AyrshareAuthAction::GetProfiles {} => {
            let profiles = state.providers.ayrshare()?.get_profiles().await?;
            Ok(success(profiles).into_response())
        }
        AyrshareAuthAction::GetProfileStatus(p) => {
            let key = resolve_profile_key(&state, &caller, p.profile_key).await?;
            let status = state.providers.ayrshare()?.get_profile_status(&key).await?;
            Ok(success(status).into_response())
        }
        AyrshareAuthAction::UnlinkProfile(p) => unlink_profile(&state, &caller, p).await,
    }
}

async fn create_profile(
    state: &AppState,
    caller: &Caller,
    title: &str,
) -> Result<Response, FunctionError> {
    let user = caller.require()?;
    let created = state.providers.ayrshare()?.create_profile(title).await?;

    reach_db::upsert_credential(
        &state.pool,
        user.id,
        CredentialProvider::Ayrshare,
        &NewCredential {
            profile_key: Some(&created.profile_key),
            ..NewCredential::default()
        },
    )
    .await
    .map_err(|e| FunctionError::database(&e))?;

    tracing::info!(user_id = %user.id, "ayrshare profile created");
    Ok(success(created).into_response())
}

/// Unlinks one social account, or deletes the whole Ayrshare profile when no
/// platform is given.
///
/// Unlinking an account works with an explicit profile key alone. Deleting a
/// profile requires a signed-in caller, and the caller's stored credential is
/// removed only when it holds the deleted key.
async fn unlink_profile(
    state: &AppState,
    caller: &Caller,
    payload: UnlinkPayload,
) -> Result<Response, FunctionError> {
    if let Some(platform) = payload.platform.as_deref().filter(|p| !p.trim().is_empty()) {
        let key = resolve_profile_key(state, caller, payload.profile_key).await?;
        let vendor = state.providers.ayrshare()?.unlink_social(&key, platform).await?;
        return Ok(success(json!({ "platform": platform, "result": vendor })).into_response());
    }

    let user = caller.require()?;
    let ayrshare = state.providers.ayrshare()?;
    let stored = reach_db::get_credential(&state.pool, user.id, CredentialProvider::Ayrshare)
        .await
        .map_err(|e| FunctionError::database(&e))?;
    let key = match payload.profile_key.filter(|k| !k.trim().is_empty()) {
        Some(key) => key,
        None => stored
            .as_ref()
            .and_then(|row| row.profile_key.clone())
            .ok_or(ProviderError::NotConnected {
                provider: Provider::Ayrshare,
            })?,
    };

    let vendor = ayrshare.delete_profile(&key).await?;
    let mut credential_removed = false;
    if holds_profile_key(stored.as_ref(), &key) {
        credential_removed =
            reach_db::delete_credential(&state.pool, user.id, CredentialProvider::Ayrshare)
                .await
                .map_err(|e| FunctionError::database(&e))?;
    }

    tracing::info!(user_id = %user.id, credential_removed, "ayrshare profile deleted");
    Ok(success(json!({
        "profileDeleted": true,
        "credentialRemoved": credential_removed,
        "result": vendor,
    }))
    .into_response())
}

fn holds_profile_key(stored: Option<&CredentialRow>, key: &str) -> bool {
    stored.and_then(|row| row.profile_key.as_deref()) == Some(key)
}
