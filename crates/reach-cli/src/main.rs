mod dictionary;
mod lookup;

use clap::{Parser, Subcommand};
use reach_core::AppConfig;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "reach-cli")]
#[command(about = "Creator-reach operations: database, vendor status and lookups")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Show Modash account health and remaining credits
    Status,
    /// Print a Modash filter dictionary, served from the cache when fresh
    Dictionary {
        /// Dictionary kind: locations, interests, brands or languages
        kind: String,
        /// Case-insensitive name filter
        #[arg(long)]
        query: Option<String>,
        /// Maximum number of entries (1-200)
        #[arg(long)]
        limit: Option<u32>,
        /// Platform whose dictionary to read
        #[arg(long, default_value = "instagram")]
        platform: String,
    },
    /// Look up a creator's public profile through Ayrshare
    Lookup {
        username: String,
        /// Single platform to query; all lookup platforms when omitted
        #[arg(long)]
        platform: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

async fn connect(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = reach_db::PoolConfig::from_app_config(config);
    Ok(reach_db::connect_pool(&config.database_url, pool_config).await?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("reach-cli: no command given; run with --help");
        return Ok(());
    };

    let config = reach_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            let pool = connect(&config).await?;
            reach_db::ping(&pool).await?;
            println!("database ok");
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let pool = connect(&config).await?;
            let applied = reach_db::run_migrations(&pool).await?;
            println!("migrations applied: {applied}");
        }
        Commands::Status => {
            let providers = reach_providers::ProviderSet::from_config(&config.providers)?;
            let status =
                reach_providers::modash::service_status(providers.modash_if_configured()).await;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Dictionary {
            kind,
            query,
            limit,
            platform,
        } => {
            let pool = connect(&config).await?;
            dictionary::run_dictionary(
                &pool,
                &config,
                &dictionary::DictionaryArgs {
                    kind: &kind,
                    query: query.as_deref(),
                    limit,
                    platform: &platform,
                },
            )
            .await?;
        }
        Commands::Lookup { username, platform } => {
            lookup::run_lookup(&config, &username, platform.as_deref()).await?;
        }
    }

    Ok(())
}
