use crate::app_config::{
    AppConfig, Environment, ProviderConfig, DEFAULT_AYRSHARE_BASE_URL, DEFAULT_MODASH_BASE_URL,
    DEFAULT_TIKTOK_AUTH_URL, DEFAULT_TIKTOK_BASE_URL, DEFAULT_USER_AGENT,
};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty strings count as unset so `.env` templates with blank keys work.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("REACH_ENV", "development"));
    let bind_addr = parse_addr("REACH_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("REACH_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("REACH_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("REACH_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("REACH_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let ttl_hours = parse_u32("REACH_DICTIONARY_TTL_HOURS", "24")?;
    if ttl_hours == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "REACH_DICTIONARY_TTL_HOURS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let providers = ProviderConfig {
        request_timeout_secs: parse_u64("REACH_VENDOR_TIMEOUT_SECS", "30")?,
        user_agent: or_default("REACH_USER_AGENT", DEFAULT_USER_AGENT),
        ayrshare_api_key: optional("AYRSHARE_API_KEY"),
        ayrshare_private_key: optional("AYRSHARE_PRIVATE_KEY"),
        ayrshare_domain: optional("AYRSHARE_DOMAIN"),
        ayrshare_base_url: or_default("AYRSHARE_BASE_URL", DEFAULT_AYRSHARE_BASE_URL),
        modash_api_key: optional("MODASH_API_KEY"),
        modash_base_url: or_default("MODASH_BASE_URL", DEFAULT_MODASH_BASE_URL),
        tiktok_client_key: optional("TIKTOK_CLIENT_KEY"),
        tiktok_client_secret: optional("TIKTOK_CLIENT_SECRET"),
        tiktok_redirect_uri: optional("TIKTOK_REDIRECT_URI"),
        tiktok_base_url: or_default("TIKTOK_BASE_URL", DEFAULT_TIKTOK_BASE_URL),
        tiktok_auth_url: or_default("TIKTOK_AUTH_URL", DEFAULT_TIKTOK_AUTH_URL),
        supabase_url: optional("SUPABASE_URL"),
        supabase_anon_key: optional("SUPABASE_ANON_KEY"),
    };

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        dictionary_ttl_hours: i64::from(ttl_hours),
        providers,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
