use serde::Serialize;
use serde_json::Value;

use super::ModashClient;
use crate::error::ProviderError;
use crate::normalize::FieldAliases;

/// Remaining credits below this mark the account as degraded.
pub const LOW_CREDIT_THRESHOLD: f64 = 100.0;

const CREDITS: FieldAliases = FieldAliases(&["billing.credits", "credits"]);
const PLAN: FieldAliases = FieldAliases(&["billing.plan", "plan.name", "plan"]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceHealth {
    Healthy,
    Degraded,
    Down,
    Unconfigured,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatus {
    pub health: ServiceHealth,
    pub credits: Option<f64>,
    pub plan: Option<String>,
    pub degraded: bool,
    pub message: String,
}

impl ServiceStatus {
    #[must_use]
    pub fn unconfigured() -> Self {
        Self {
            health: ServiceHealth::Unconfigured,
            credits: None,
            plan: None,
            degraded: true,
            message: "Modash API key is not configured".to_string(),
        }
    }

    #[must_use]
    pub fn from_error(err: &ProviderError) -> Self {
        Self {
            health: ServiceHealth::Down,
            credits: None,
            plan: None,
            degraded: true,
            message: err
                .user_help()
                .unwrap_or_else(|| format!("Modash is unavailable: {err}")),
        }
    }

    /// Summarizes a `user/info` payload.
    #[must_use]
    pub fn from_info(raw: &Value) -> Self {
        let credits = CREDITS.f64(raw);
        let plan = PLAN.str(raw);
        let low = credits.is_some_and(|c| c < LOW_CREDIT_THRESHOLD);
        let (health, message) = if low {
            (
                ServiceHealth::Degraded,
                format!(
                    "Modash credits are running low ({} remaining)",
                    credits.unwrap_or_default()
                ),
            )
        } else {
            (ServiceHealth::Healthy, "Modash is operational".to_string())
        };
        Self {
            health,
            credits,
            plan,
            degraded: low,
            message,
        }
    }
}

impl ModashClient {
    /// Raw account info: remaining credits and plan.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Vendor`] on a non-2xx response.
    pub async fn user_info(&self) -> Result<Value, ProviderError> {
        self.http.get_json("user/info", &[], None).await
    }
}

/// Health summary for the Modash integration. Never fails: vendor errors are
/// reported as [`ServiceHealth::Down`].
pub async fn service_status(client: Option<&ModashClient>) -> ServiceStatus {
    let Some(client) = client else {
        return ServiceStatus::unconfigured();
    };
    match client.user_info().await {
        Ok(raw) => ServiceStatus::from_info(&raw),
        Err(e) => {
            tracing::warn!(error = %e, "modash status check failed");
            ServiceStatus::from_error(&e)
        }
    }
}
