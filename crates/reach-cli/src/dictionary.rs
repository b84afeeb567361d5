use chrono::TimeDelta;
use reach_core::{AppConfig, CachedLookup, DictionaryKey, DictionaryKind, Platform};
use reach_db::PgDictionaryStore;
use reach_providers::ProviderSet;

pub(crate) struct DictionaryArgs<'a> {
    pub kind: &'a str,
    pub query: Option<&'a str>,
    pub limit: Option<u32>,
    pub platform: &'a str,
}

/// Prints dictionary entries, reading through the Postgres cache.
///
/// # Errors
///
/// Returns an error if the kind or platform is invalid, Modash is not
/// configured, or the cache or vendor request fails.
pub(crate) async fn run_dictionary(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    args: &DictionaryArgs<'_>,
) -> anyhow::Result<()> {
    let kind: DictionaryKind = args.kind.parse()?;
    let platform: Platform = args.platform.parse()?;
    if !platform.is_discoverable() {
        anyhow::bail!("dictionaries are not available for {platform}");
    }
    let key = DictionaryKey::new(platform, kind, args.query, args.limit);

    let providers = ProviderSet::from_config(&config.providers)?;
    let modash = providers.modash()?;
    let cache = CachedLookup::new(
        PgDictionaryStore::new(pool.clone()),
        TimeDelta::hours(config.dictionary_ttl_hours),
    );
    let lookup = cache
        .get_or_fetch(&key, || modash.fetch_dictionary(&key))
        .await?;

    if lookup.values.is_empty() {
        println!("no {} entries found", kind.collection());
        return Ok(());
    }

    println!("{:<24}{:<12}NAME", "ID", "TYPE");
    for entry in &lookup.values {
        println!(
            "{:<24}{:<12}{}",
            entry.entry_id,
            entry.entry_type.as_deref().unwrap_or("-"),
            entry.name
        );
    }
    tracing::info!(
        platform = %platform,
        kind = %kind,
        source = ?lookup.source,
        count = lookup.values.len(),
        "dictionary printed"
    );
    Ok(())
}
