use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use reach_providers::{AuthUser, ProviderSet};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::FunctionError;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// The authenticated user behind the request, if a session token resolved.
#[derive(Debug, Clone, Default)]
pub struct Caller(pub Option<AuthUser>);

impl Caller {
    /// # Errors
    ///
    /// Returns a 401 [`FunctionError`] when no session resolved.
    pub fn require(&self) -> Result<&AuthUser, FunctionError> {
        self.0.as_ref().ok_or_else(|| {
            FunctionError::unauthorized("Authentication required")
                .with_help("Sign in again and retry.")
        })
    }

    #[must_use]
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|u| u.id)
    }
}

/// Refuses to start outside development without an identity provider, since
/// every per-user action would then be unreachable.
///
/// # Errors
///
/// Returns an error when `SUPABASE_URL`/`SUPABASE_ANON_KEY` are unset in a
/// non-development environment.
pub fn check_identity_config(providers: &ProviderSet, is_development: bool) -> anyhow::Result<()> {
    if providers.identity().is_some() {
        return Ok(());
    }
    if is_development {
        tracing::warn!(
            "SUPABASE_URL/SUPABASE_ANON_KEY not set; requests run without a signed-in user"
        );
        return Ok(());
    }
    anyhow::bail!("SUPABASE_URL and SUPABASE_ANON_KEY are required outside development")
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter shared by every function endpoint.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Resolves the bearer token into a [`Caller`].
///
/// Requests without a token (or with identity disabled) proceed anonymously;
/// a token the identity provider rejects is answered with 401.
pub async fn resolve_caller(
    State(providers): State<Arc<ProviderSet>>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = extract_bearer_token(req.headers().get(AUTHORIZATION)).map(ToOwned::to_owned);

    let caller = match (token, providers.identity()) {
        (Some(token), Some(identity)) => match identity.get_user(&token).await {
            Ok(user) => Caller(Some(user)),
            Err(e) => {
                tracing::debug!(error = %e, "session token rejected");
                return FunctionError::new(StatusCode::UNAUTHORIZED, "Invalid or expired session")
                    .with_help("Your session has expired. Sign in again and retry.")
                    .into_response();
            }
        },
        _ => Caller(None),
    };

    req.extensions_mut().insert(caller);
    next.run(req).await
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;
    let elapsed = window.started_at.elapsed();

    if elapsed >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        return FunctionError::new(StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded")
            .with_help("Too many requests. Wait a minute and try again.")
            .into_response();
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
        let blank = HeaderValue::from_static("Bearer   ");
        assert_eq!(extract_bearer_token(Some(&blank)), None);
    }

    #[test]
    fn identity_is_optional_only_in_development() {
        let providers = ProviderSet::default();
        assert!(check_identity_config(&providers, true).is_ok());
        assert!(check_identity_config(&providers, false).is_err());
    }

    #[test]
    fn anonymous_caller_is_rejected_by_require() {
        let err = Caller(None).require().unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
