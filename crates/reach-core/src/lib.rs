pub mod app_config;
pub mod cache;
pub mod config;
pub mod dictionary;
pub mod metrics;
pub mod monitor;
pub mod platform;
pub mod profile;
pub mod tier;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, ProviderConfig};
pub use cache::{CacheSource, CacheStore, CachedLookup, Lookup, LookupError};
pub use config::{load_app_config, load_app_config_from_env};
pub use dictionary::{DictionaryEntry, DictionaryKey, DictionaryKind};
pub use metrics::{derive_metrics, DerivedMetrics, PostingFrequency, RawCounts};
pub use monitor::{match_post, MonitorRule, ObservedPost};
pub use platform::Platform;
pub use profile::CreatorProfile;
pub use tier::FollowerTier;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("unknown dictionary kind: {0}")]
    UnknownDictionaryKind(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
