mod api;
mod middleware;

use std::sync::Arc;

use chrono::TimeDelta;
use reach_providers::ProviderSet;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, default_rate_limit_state, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = reach_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = reach_db::PoolConfig::from_app_config(&config);
    let pool = reach_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = reach_db::run_migrations(&pool).await?;
    tracing::info!(applied, "database migrations complete");

    let providers = Arc::new(ProviderSet::from_config(&config.providers)?);
    middleware::check_identity_config(
        &providers,
        matches!(config.env, reach_core::Environment::Development),
    )?;

    let state = AppState {
        pool,
        providers,
        dictionary_ttl: TimeDelta::hours(config.dictionary_ttl_hours),
    };
    let app = build_app(state, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "reach-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
