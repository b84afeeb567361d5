//! Read-through cache with a freshness window over a persistent store.
//!
//! [`CachedLookup`] asks its [`CacheStore`] for rows newer than `now - ttl`.
//! Any row counts as a hit. On a miss the caller-supplied fetch runs exactly
//! once, its result is written back with a fresh timestamp, and the fetched
//! values are returned as-is (they are not re-read from the store). A failed
//! fetch is returned to the caller; stale rows are never served as a fallback.

use std::future::Future;
use std::marker::PhantomData;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use thiserror::Error;

/// Persistence side of a [`CachedLookup`].
pub trait CacheStore<K, V> {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns cached values for `key` written after `fresh_since`.
    fn load_fresh(
        &self,
        key: &K,
        fresh_since: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<V>, Self::Error>> + Send;

    /// Writes freshly fetched values for `key`, stamped with `fetched_at`.
    fn store(
        &self,
        key: &K,
        values: &[V],
        fetched_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSource {
    Hit,
    Miss,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lookup<V> {
    pub values: Vec<V>,
    pub source: CacheSource,
}

#[derive(Debug, Error)]
pub enum LookupError<S, F>
where
    S: std::error::Error + 'static,
    F: std::error::Error + 'static,
{
    #[error("cache store error: {0}")]
    Store(#[source] S),

    #[error("fetch error: {0}")]
    Fetch(#[source] F),
}

pub struct CachedLookup<K, V, S> {
    store: S,
    ttl: TimeDelta,
    _entry: PhantomData<fn(&K) -> V>,
}

impl<K, V, S> CachedLookup<K, V, S>
where
    S: CacheStore<K, V>,
{
    #[must_use]
    pub fn new(store: S, ttl: TimeDelta) -> Self {
        Self {
            store,
            ttl,
            _entry: PhantomData,
        }
    }

    #[must_use]
    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Serves `key` from the store, or runs `fetch` and writes its result back.
    ///
    /// # Errors
    ///
    /// - [`LookupError::Store`] if reading or writing the store fails.
    /// - [`LookupError::Fetch`] if the cache missed and `fetch` failed.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: &K,
        fetch: F,
    ) -> Result<Lookup<V>, LookupError<S::Error, E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<V>, E>>,
        E: std::error::Error + 'static,
    {
        self.get_or_fetch_at(key, Utc::now(), fetch).await
    }

    /// Same as [`CachedLookup::get_or_fetch`] with an explicit clock reading.
    ///
    /// # Errors
    ///
    /// See [`CachedLookup::get_or_fetch`].
    pub async fn get_or_fetch_at<F, Fut, E>(
        &self,
        key: &K,
        now: DateTime<Utc>,
        fetch: F,
    ) -> Result<Lookup<V>, LookupError<S::Error, E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<V>, E>>,
        E: std::error::Error + 'static,
    {
        let fresh_since = now - self.ttl;
        let cached = self
            .store
            .load_fresh(key, fresh_since)
            .await
            .map_err(LookupError::Store)?;

        if !cached.is_empty() {
            return Ok(Lookup {
                values: cached,
                source: CacheSource::Hit,
            });
        }

        let fetched = fetch().await.map_err(LookupError::Fetch)?;
        self.store
            .store(key, &fetched, now)
            .await
            .map_err(LookupError::Store)?;

        Ok(Lookup {
            values: fetched,
            source: CacheSource::Miss,
        })
    }
}
