use std::net::SocketAddr;

pub const DEFAULT_AYRSHARE_BASE_URL: &str = "https://api.ayrshare.com/api/";
pub const DEFAULT_MODASH_BASE_URL: &str = "https://api.modash.io/v1/";
pub const DEFAULT_TIKTOK_BASE_URL: &str = "https://open.tiktokapis.com/v2/";
pub const DEFAULT_TIKTOK_AUTH_URL: &str = "https://www.tiktok.com/v2/auth/authorize/";
pub const DEFAULT_USER_AGENT: &str = "reach/0.1 (creator-discovery)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Credentials and endpoints for every third-party API the service talks to.
///
/// Built once at startup and handed to the provider clients; nothing reads
/// vendor settings from the process environment after that.
#[derive(Clone)]
pub struct ProviderConfig {
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub ayrshare_api_key: Option<String>,
    pub ayrshare_private_key: Option<String>,
    pub ayrshare_domain: Option<String>,
    pub ayrshare_base_url: String,
    pub modash_api_key: Option<String>,
    pub modash_base_url: String,
    pub tiktok_client_key: Option<String>,
    pub tiktok_client_secret: Option<String>,
    pub tiktok_redirect_uri: Option<String>,
    pub tiktok_base_url: String,
    pub tiktok_auth_url: String,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            ayrshare_api_key: None,
            ayrshare_private_key: None,
            ayrshare_domain: None,
            ayrshare_base_url: DEFAULT_AYRSHARE_BASE_URL.to_string(),
            modash_api_key: None,
            modash_base_url: DEFAULT_MODASH_BASE_URL.to_string(),
            tiktok_client_key: None,
            tiktok_client_secret: None,
            tiktok_redirect_uri: None,
            tiktok_base_url: DEFAULT_TIKTOK_BASE_URL.to_string(),
            tiktok_auth_url: DEFAULT_TIKTOK_AUTH_URL.to_string(),
            supabase_url: None,
            supabase_anon_key: None,
        }
    }
}

fn redact(value: Option<&String>) -> Option<&'static str> {
    value.map(|_| "[redacted]")
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("ayrshare_api_key", &redact(self.ayrshare_api_key.as_ref()))
            .field(
                "ayrshare_private_key",
                &redact(self.ayrshare_private_key.as_ref()),
            )
            .field("ayrshare_domain", &self.ayrshare_domain)
            .field("ayrshare_base_url", &self.ayrshare_base_url)
            .field("modash_api_key", &redact(self.modash_api_key.as_ref()))
            .field("modash_base_url", &self.modash_base_url)
            .field("tiktok_client_key", &self.tiktok_client_key)
            .field(
                "tiktok_client_secret",
                &redact(self.tiktok_client_secret.as_ref()),
            )
            .field("tiktok_redirect_uri", &self.tiktok_redirect_uri)
            .field("tiktok_base_url", &self.tiktok_base_url)
            .field("tiktok_auth_url", &self.tiktok_auth_url)
            .field("supabase_url", &self.supabase_url)
            .field("supabase_anon_key", &redact(self.supabase_anon_key.as_ref()))
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub dictionary_ttl_hours: i64,
    pub providers: ProviderConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("dictionary_ttl_hours", &self.dictionary_ttl_hours)
            .field("providers", &self.providers)
            .finish()
    }
}
