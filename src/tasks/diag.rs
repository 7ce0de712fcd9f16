use anyhow::Result;

use crate::cache::QueryCache;

/// Share of lookups served from the cache, 0 when nothing was looked up yet.
pub fn hit_ratio(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

pub async fn log_cache_stats(cache: QueryCache) -> Result<()> {
    let (hits, misses) = cache.stats().snapshot();
    tracing::info!(
        "hit_ratio={:.2}, cache_hits={}, cache_misses={}",
        hit_ratio(hits, misses),
        hits,
        misses
    );
    Ok(())
}
