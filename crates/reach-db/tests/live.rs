//! Live integration tests for reach-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. They need `DATABASE_URL` pointing at a server the
//! harness can create databases on, so they are ignored by default:
//! `cargo test -p reach-db -- --ignored`.

use chrono::{TimeDelta, Utc};
use reach_core::{
    CacheSource, CachedLookup, CreatorProfile, DictionaryEntry, DictionaryKey, DictionaryKind,
    MonitorRule, ObservedPost, Platform,
};
use reach_db::{
    create_monitor, delete_credential, delete_monitor, get_credential, get_monitor,
    insert_monitor_hit, insert_search_log, list_active_monitors, list_fresh_dictionary_entries,
    list_monitor_hits, save_oauth_state, take_oauth_state, update_monitor,
    upsert_creator_profile, upsert_credential, upsert_dictionary_entries, CredentialProvider,
    MonitorFields, NewCredential, NewMonitorHit, NewSearchLog, PgDictionaryStore,
};
use uuid::Uuid;

fn entry(kind: DictionaryKind, id: &str, name: &str) -> DictionaryEntry {
    DictionaryEntry {
        platform: Platform::Instagram,
        kind,
        entry_id: id.to_string(),
        name: name.to_string(),
        entry_type: None,
        updated_at: Utc::now(),
    }
}

fn post(id: &str, content: &str) -> ObservedPost {
    ObservedPost {
        platform: Platform::TikTok,
        external_post_id: id.to_string(),
        author_username: Some("creator".to_string()),
        content: content.to_string(),
        url: None,
        follower_count: Some(20_000),
        engagement_rate: Some(0.03),
        posted_at: None,
    }
}

// ---------------------------------------------------------------------------
// dictionary cache
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn dictionary_upsert_then_fresh_read_filters_by_name(pool: sqlx::PgPool) {
    let now = Utc::now();
    let written = upsert_dictionary_entries(
        &pool,
        &[
            entry(DictionaryKind::Location, "1", "New York"),
            entry(DictionaryKind::Location, "2", "Boston"),
            entry(DictionaryKind::Location, "1", "New York (dup)"),
        ],
        now,
    )
    .await
    .expect("upsert");
    assert_eq!(written, 2);

    let key = DictionaryKey::new(
        Platform::Instagram,
        DictionaryKind::Location,
        Some("YORK"),
        None,
    );
    let rows = list_fresh_dictionary_entries(&pool, &key, now - TimeDelta::hours(24))
        .await
        .expect("read");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "New York");

    // A freshness cutoff after the write excludes everything.
    let rows = list_fresh_dictionary_entries(&pool, &key, now + TimeDelta::seconds(1))
        .await
        .expect("read");
    assert!(rows.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn like_wildcards_in_query_match_literally(pool: sqlx::PgPool) {
    let now = Utc::now();
    upsert_dictionary_entries(
        &pool,
        &[
            entry(DictionaryKind::Brand, "1", "100% Juice"),
            entry(DictionaryKind::Brand, "2", "1000 Islands"),
        ],
        now,
    )
    .await
    .expect("upsert");

    let key = DictionaryKey::new(
        Platform::Instagram,
        DictionaryKind::Brand,
        Some("100%"),
        None,
    );
    let rows = list_fresh_dictionary_entries(&pool, &key, now - TimeDelta::hours(1))
        .await
        .expect("read");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].entry_id, "1");
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn cached_lookup_over_postgres_hits_after_first_fetch(pool: sqlx::PgPool) {
    let cache = CachedLookup::new(PgDictionaryStore::new(pool), TimeDelta::hours(24));
    let key = DictionaryKey::new(Platform::Instagram, DictionaryKind::Interest, None, None);

    let first = cache
        .get_or_fetch(&key, || async {
            Ok::<_, std::io::Error>(vec![entry(DictionaryKind::Interest, "7", "Fitness")])
        })
        .await
        .expect("first lookup");
    assert_eq!(first.source, CacheSource::Miss);

    let second = cache
        .get_or_fetch(&key, || async {
            Err::<Vec<DictionaryEntry>, _>(std::io::Error::other("vendor must not be called"))
        })
        .await
        .expect("second lookup");
    assert_eq!(second.source, CacheSource::Hit);
    assert_eq!(second.values[0].name, "Fitness");
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn same_entry_id_on_two_platforms_is_cached_separately(pool: sqlx::PgPool) {
    let now = Utc::now();
    let tiktok = DictionaryEntry {
        platform: Platform::TikTok,
        ..entry(DictionaryKind::Interest, "13", "Gaming (TikTok)")
    };
    let written = upsert_dictionary_entries(
        &pool,
        &[entry(DictionaryKind::Interest, "13", "Gaming"), tiktok],
        now,
    )
    .await
    .expect("upsert");
    assert_eq!(written, 2);

    let since = now - TimeDelta::hours(1);
    let instagram_key =
        DictionaryKey::new(Platform::Instagram, DictionaryKind::Interest, None, None);
    let rows = list_fresh_dictionary_entries(&pool, &instagram_key, since)
        .await
        .expect("read");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Gaming");

    let youtube_key = DictionaryKey::new(Platform::YouTube, DictionaryKind::Interest, None, None);
    let rows = list_fresh_dictionary_entries(&pool, &youtube_key, since)
        .await
        .expect("read");
    assert!(rows.is_empty());
}

// ---------------------------------------------------------------------------
// credentials
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn credential_upsert_keeps_unset_columns(pool: sqlx::PgPool) {
    let owner = Uuid::new_v4();
    upsert_credential(
        &pool,
        owner,
        CredentialProvider::TikTok,
        &NewCredential {
            access_token: Some("act.1"),
            refresh_token: Some("rft.1"),
            open_id: Some("open-1"),
            ..NewCredential::default()
        },
    )
    .await
    .expect("insert");

    let row = upsert_credential(
        &pool,
        owner,
        CredentialProvider::TikTok,
        &NewCredential {
            access_token: Some("act.2"),
            ..NewCredential::default()
        },
    )
    .await
    .expect("update");
    assert_eq!(row.access_token.as_deref(), Some("act.2"));
    assert_eq!(row.refresh_token.as_deref(), Some("rft.1"));
    assert_eq!(row.open_id.as_deref(), Some("open-1"));

    assert!(get_credential(&pool, owner, CredentialProvider::Ayrshare)
        .await
        .expect("get")
        .is_none());
    assert!(delete_credential(&pool, owner, CredentialProvider::TikTok)
        .await
        .expect("delete"));
    assert!(get_credential(&pool, owner, CredentialProvider::TikTok)
        .await
        .expect("get")
        .is_none());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn oauth_state_is_single_use_and_owner_scoped(pool: sqlx::PgPool) {
    let now = Utc::now();
    let owner = Uuid::new_v4();
    let tiktok = CredentialProvider::TikTok;
    save_oauth_state(&pool, owner, tiktok, "state-1", now + TimeDelta::minutes(15))
        .await
        .expect("save");

    // Another user cannot redeem it, and that attempt does not consume it.
    assert!(!take_oauth_state(&pool, Uuid::new_v4(), tiktok, "state-1", now)
        .await
        .expect("take"));
    assert!(take_oauth_state(&pool, owner, tiktok, "state-1", now)
        .await
        .expect("take"));
    assert!(!take_oauth_state(&pool, owner, tiktok, "state-1", now)
        .await
        .expect("take"));

    save_oauth_state(&pool, owner, tiktok, "state-2", now + TimeDelta::minutes(15))
        .await
        .expect("save");
    assert!(!take_oauth_state(&pool, owner, tiktok, "state-2", now + TimeDelta::hours(1))
        .await
        .expect("take"));
}

// ---------------------------------------------------------------------------
// creators & search logs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn creator_upsert_is_idempotent_on_platform_and_id(pool: sqlx::PgPool) {
    let mut profile = CreatorProfile::new(Platform::Instagram, "ig-1", "acme");
    profile.follower_count = 5_000;
    let first = upsert_creator_profile(&pool, &profile).await.expect("insert");

    profile.follower_count = 6_000;
    let second = upsert_creator_profile(&pool, &profile).await.expect("update");
    assert_eq!(first, second);

    let followers: i64 =
        sqlx::query_scalar("SELECT follower_count FROM creator_profiles WHERE id = $1")
            .bind(first)
            .fetch_one(&pool)
            .await
            .expect("select");
    assert_eq!(followers, 6_000);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn search_log_insert_returns_id(pool: sqlx::PgPool) {
    let filters = serde_json::json!({"influencer": {"followers": {"min": 1000}}});
    let id = insert_search_log(
        &pool,
        &NewSearchLog {
            user_id: None,
            platform: "instagram",
            filters: &filters,
            result_count: 15,
            estimated_credits: 0.15,
            actual_credits: Some(1.0),
        },
    )
    .await
    .expect("insert");
    assert!(id > 0);
}

// ---------------------------------------------------------------------------
// brand monitors
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn monitor_lifecycle_is_owner_scoped(pool: sqlx::PgPool) {
    let owner = Uuid::new_v4();
    let rule = MonitorRule {
        keywords: vec!["fizz".to_string()],
        platforms: vec![Platform::TikTok],
        ..MonitorRule::default()
    };
    let created = create_monitor(
        &pool,
        owner,
        &MonitorFields {
            name: "Acme",
            rule: &rule,
            is_active: true,
        },
    )
    .await
    .expect("create");
    assert_eq!(created.rule().expect("rule"), rule);

    let stranger = Uuid::new_v4();
    assert!(get_monitor(&pool, stranger, created.public_id)
        .await
        .expect("get")
        .is_none());

    let updated = update_monitor(
        &pool,
        owner,
        created.public_id,
        &MonitorFields {
            name: "Acme paused",
            rule: &rule,
            is_active: false,
        },
    )
    .await
    .expect("update")
    .expect("row");
    assert_eq!(updated.name, "Acme paused");
    assert!(list_active_monitors(&pool, owner)
        .await
        .expect("list")
        .is_empty());

    assert!(!delete_monitor(&pool, stranger, created.public_id)
        .await
        .expect("delete"));
    assert!(delete_monitor(&pool, owner, created.public_id)
        .await
        .expect("delete"));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_hits_are_ignored(pool: sqlx::PgPool) {
    let owner = Uuid::new_v4();
    let rule = MonitorRule::default();
    let monitor = create_monitor(
        &pool,
        owner,
        &MonitorFields {
            name: "Acme",
            rule: &rule,
            is_active: true,
        },
    )
    .await
    .expect("create");

    let observed = post("v1", "fizz time");
    let terms = vec!["fizz".to_string()];
    let hit = NewMonitorHit {
        post: &observed,
        matched_terms: &terms,
    };
    assert!(insert_monitor_hit(&pool, monitor.id, &hit).await.expect("insert"));
    assert!(!insert_monitor_hit(&pool, monitor.id, &hit).await.expect("insert"));

    let hits = list_monitor_hits(&pool, monitor.id, 50).await.expect("list");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].matched_terms, terms);
}
