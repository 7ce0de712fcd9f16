use std::{
    collections::VecDeque,
    fmt,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use moka::{Expiry, future::Cache};
use serde_json::Value;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

use crate::{domain::Query, error::ClientError};

const DEFAULT_MAX_ENTRIES: u64 = 1_024;
const INVALIDATION_LOG_LEN: usize = 64;

/// A cached payload. Never handed out by reference, callers get the shared `Arc<Value>`.
#[derive(Clone)]
struct CacheEntry {
    value: Arc<Value>,
    stored_at: OffsetDateTime,
    ttl: Duration,
    /// Invalidation generation observed when the fetch started.
    generation: u64,
}

impl CacheEntry {
    fn new(value: Value, ttl: Duration, generation: u64) -> Self {
        Self {
            value: Arc::new(value),
            stored_at: OffsetDateTime::now_utc(),
            ttl,
            generation,
        }
    }
}

/// Every entry lives exactly as long as the ttl it was stored with.
struct PerEntryTtl;

impl Expiry<Query, CacheEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &Query,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &Query,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

type QueryPredicate = dyn Fn(&Query) -> bool + Send + Sync;

/// Which entries an invalidation drops.
#[derive(Clone)]
pub enum Invalidation {
    All,
    /// Every entry of one operation, whatever its parameters.
    Operation(String),
    Matching(Arc<QueryPredicate>),
}

impl Invalidation {
    pub fn operation(name: impl Into<String>) -> Self {
        Invalidation::Operation(name.into())
    }

    pub fn matching<F>(predicate: F) -> Self
    where
        F: Fn(&Query) -> bool + Send + Sync + 'static,
    {
        Invalidation::Matching(Arc::new(predicate))
    }

    pub fn matches(&self, query: &Query) -> bool {
        match self {
            Invalidation::All => true,
            Invalidation::Operation(name) => query.operation() == name,
            Invalidation::Matching(predicate) => predicate(query),
        }
    }
}

impl fmt::Debug for Invalidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invalidation::All => f.write_str("All"),
            Invalidation::Operation(name) => f.debug_tuple("Operation").field(name).finish(),
            Invalidation::Matching(_) => f.write_str("Matching(..)"),
        }
    }
}

/// Recent invalidations, numbered. Lets a fetch that was in flight during an
/// invalidation find out that its answer is already stale.
#[derive(Default)]
struct InvalidationLog {
    generation: u64,
    recent: VecDeque<(u64, Invalidation)>,
}

impl InvalidationLog {
    fn record(&mut self, invalidation: Invalidation) -> u64 {
        self.generation += 1;
        if self.recent.len() == INVALIDATION_LOG_LEN {
            self.recent.pop_front();
        }
        self.recent.push_back((self.generation, invalidation));
        self.generation
    }

    /// Generation of the first invalidation after `since` that covers `query`.
    fn covering_since(&self, since: u64, query: &Query) -> Option<u64> {
        if since >= self.generation {
            return None;
        }
        // the log no longer reaches back that far, assume the worst
        if self.recent.front().is_some_and(|(oldest, _)| *oldest > since + 1) {
            return Some(since + 1);
        }
        self.recent
            .iter()
            .find(|(generation, invalidation)| *generation > since && invalidation.matches(query))
            .map(|(generation, _)| *generation)
    }
}

/// Hit/miss counters for the cache.
#[derive(Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    pub fn cache_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// (hits, misses)
    pub fn snapshot(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

/// Time-bounded memo of fetch results keyed by [`Query`].
///
/// Concurrent lookups of the same query share one in-flight fetch. Failures are
/// never stored, and neither is an answer whose fetch started before an
/// invalidation covering its query. Cloning is cheap and clones share entries and stats.
#[derive(Clone)]
pub struct QueryCache {
    entries: Cache<Query, CacheEntry>,
    invalidations: Arc<Mutex<InvalidationLog>>,
    stats: Arc<CacheStats>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl QueryCache {
    pub fn new(max_entries: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .support_invalidation_closures()
            .build();

        Self {
            entries,
            invalidations: Arc::default(),
            stats: Arc::new(CacheStats::default()),
        }
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn invalidation_log(&self) -> MutexGuard<'_, InvalidationLog> {
        self.invalidations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn generation(&self) -> u64 {
        self.invalidation_log().generation
    }

    /// Returns the cached value for `query` if it is younger than its ttl, otherwise runs `fetch`.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        query: &Query,
        ttl: Duration,
        fetch: F,
    ) -> Result<Arc<Value>, ClientError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Value, ClientError>>,
    {
        self.get_or_fetch_until(query, ttl, &CancellationToken::new(), fetch)
            .await
    }

    /// Same as [`QueryCache::get_or_fetch`], abandoned as soon as `cancel` fires.
    ///
    /// A fetch that completes after cancellation is discarded, not cached. A fetch
    /// overtaken by a matching invalidation is returned to the callers that were
    /// already waiting for it but not kept; callers that arrived after the
    /// invalidation fetch again.
    #[tracing::instrument(
        name = "cache::get_or_fetch",
        skip(self, query, cancel, fetch),
        fields(query = %query)
    )]
    pub async fn get_or_fetch_until<F, Fut>(
        &self,
        query: &Query,
        ttl: Duration,
        cancel: &CancellationToken,
        fetch: F,
    ) -> Result<Arc<Value>, ClientError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Value, ClientError>>,
    {
        loop {
            let arrived = self.generation();
            let init = async {
                let generation = self.generation();
                let value = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                    result = fetch() => result?,
                };
                // checked again: the response may have raced the cancellation
                if cancel.is_cancelled() {
                    return Err(ClientError::Cancelled);
                }
                Ok(CacheEntry::new(value, ttl, generation))
            };

            let lookup = self.entries.entry_by_ref(query).or_try_insert_with(init);

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                result = lookup => result,
            };

            match result {
                Ok(entry) => {
                    let fresh = entry.is_fresh();
                    let entry = entry.into_value();

                    let overtaken = self
                        .invalidation_log()
                        .covering_since(entry.generation, query);
                    if let Some(generation) = overtaken {
                        self.entries.invalidate(query).await;
                        if arrived >= generation {
                            tracing::debug!("shared fetch predates an invalidation, refetching");
                            continue;
                        }
                        self.stats.cache_miss();
                        tracing::debug!("value overtaken by an invalidation, not kept");
                        return Ok(entry.value);
                    }

                    if fresh {
                        self.stats.cache_miss();
                        tracing::debug!("cache miss, stored fresh value");
                    } else {
                        self.stats.cache_hit();
                        tracing::debug!("cache hit");
                    }
                    return Ok(entry.value);
                }
                Err(error) => match error.as_ref() {
                    // someone else's cancelled fetch, ours is still wanted
                    ClientError::Cancelled if !cancel.is_cancelled() => {
                        tracing::debug!("shared fetch was cancelled by its owner, retrying");
                        continue;
                    }
                    other => return Err(other.clone()),
                },
            }
        }
    }

    /// When the live entry for `query` was stored, if there is one.
    pub async fn stored_at(&self, query: &Query) -> Option<OffsetDateTime> {
        self.entries.get(query).await.map(|entry| entry.stored_at)
    }

    pub async fn contains(&self, query: &Query) -> bool {
        self.entries.get(query).await.is_some()
    }

    /// Drops the entries selected by `invalidation`.
    ///
    /// Fetches already in flight for a selected query still answer their callers
    /// but are not stored.
    pub fn invalidate(&self, invalidation: &Invalidation) {
        let generation = self.invalidation_log().record(invalidation.clone());
        tracing::trace!(generation, "invalidation recorded");

        match invalidation {
            Invalidation::All => {
                tracing::debug!("invalidating all cache entries");
                self.entries.invalidate_all();
            }
            selective => {
                let selective = selective.clone();
                tracing::debug!(invalidation = ?selective, "invalidating matching cache entries");
                if let Err(e) = self
                    .entries
                    .invalidate_entries_if(move |query, _| selective.matches(query))
                {
                    tracing::warn!(error = %e, "selective invalidation unavailable, flushing cache");
                    self.entries.invalidate_all();
                }
            }
        }
    }

    pub fn invalidate_all(&self) {
        self.invalidate(&Invalidation::All);
    }
}
