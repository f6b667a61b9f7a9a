use crate::error::Result;
use crate::mirror::client::{MirrorClient, token_balance_with_timeout};
use crate::registry::{Pool, PoolKey, TokenId};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Both reserve balances of a pool as last observed from the mirror.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reserves {
    pub reserve_a: u64,
    pub reserve_b: u64,
}

impl Reserves {
    pub fn is_seeded(&self) -> bool {
        self.reserve_a > 0 && self.reserve_b > 0
    }

    /// Reserves oriented as (in, out) for a given direction.
    pub fn oriented(&self, a_to_b: bool) -> (u64, u64) {
        if a_to_b { (self.reserve_a, self.reserve_b) } else { (self.reserve_b, self.reserve_a) }
    }
}

#[derive(Clone, Debug)]
struct CacheItem {
    reserves: Reserves,
    observed_at: Instant,
}

#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub invalidations: AtomicU64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 { 0.0 } else { hits as f64 / total as f64 }
    }
}

/// Short-TTL read-through cache of pool reserves.
///
/// Reserves are never authoritative locally: an entry is only a projection
/// of the pool account's mirror balances at `observed_at`. A zero TTL
/// bypasses the entry entirely, which is what every state-changing path
/// uses. Concurrent misses for the same pool collapse onto one remote read
/// via a per-pool single-flight guard.
pub struct ReserveCache {
    mirror: Arc<dyn MirrorClient>,
    entries: DashMap<PoolKey, CacheItem>,
    inflight: DashMap<PoolKey, Arc<tokio::sync::Mutex<()>>>,
    remote_timeout: Duration,
    pub stats: CacheStats,
}

impl ReserveCache {
    pub fn new(mirror: Arc<dyn MirrorClient>, remote_timeout: Duration) -> Self {
        Self {
            mirror,
            entries: DashMap::new(),
            inflight: DashMap::new(),
            remote_timeout,
            stats: CacheStats::default(),
        }
    }

    /// Read-through get. Returns the cached entry when younger than `ttl`,
    /// otherwise fetches both token balances of the pool account
    /// concurrently and caches the pair.
    pub async fn get(
        &self,
        pool: &Pool,
        token_a: &TokenId,
        token_b: &TokenId,
        ttl: Duration,
    ) -> Result<Reserves> {
        if let Some(hit) = self.fresh_entry(pool.pool_key(), ttl) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(hit);
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);

        // Single-flight: one fetch per pool at a time. Whoever loses the
        // race re-checks the entry before paying for a remote read.
        let guard = self
            .inflight
            .entry(pool.pool_key().clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let _held = guard.lock().await;

        if let Some(hit) = self.fresh_entry(pool.pool_key(), ttl) {
            return Ok(hit);
        }

        let started = Instant::now();
        let (balance_a, balance_b) = tokio::join!(
            token_balance_with_timeout(
                self.mirror.as_ref(),
                pool.account(),
                token_a,
                self.remote_timeout
            ),
            token_balance_with_timeout(
                self.mirror.as_ref(),
                pool.account(),
                token_b,
                self.remote_timeout
            ),
        );
        let reserves = Reserves { reserve_a: balance_a?, reserve_b: balance_b? };
        debug!(
            pool = %pool.pool_key(),
            reserve_a = reserves.reserve_a,
            reserve_b = reserves.reserve_b,
            elapsed = ?started.elapsed(),
            "reserves refreshed"
        );

        self.entries.insert(
            pool.pool_key().clone(),
            CacheItem { reserves, observed_at: Instant::now() },
        );
        Ok(reserves)
    }

    fn fresh_entry(&self, pool_key: &PoolKey, ttl: Duration) -> Option<Reserves> {
        if ttl.is_zero() {
            return None;
        }
        let item = self.entries.get(pool_key)?;
        if item.observed_at.elapsed() < ttl { Some(item.reserves) } else { None }
    }

    /// Drop the cached entry unconditionally. Called exactly once after a
    /// confirmed mutation; failed submissions leave the entry alone since
    /// no local state changed.
    pub fn invalidate(&self, pool_key: &PoolKey) {
        if self.entries.remove(pool_key).is_some() {
            self.stats.invalidations.fetch_add(1, Ordering::Relaxed);
            debug!(pool = %pool_key, "reserve cache invalidated");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SwapError;
    use crate::mirror::client::MirrorClient;
    use crate::registry::AccountId;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicU64;

    struct CountingMirror {
        balance_a: AtomicU64,
        balance_b: AtomicU64,
        calls: AtomicU64,
    }

    impl CountingMirror {
        fn new(a: u64, b: u64) -> Self {
            Self { balance_a: AtomicU64::new(a), balance_b: AtomicU64::new(b), calls: AtomicU64::new(0) }
        }
    }

    #[async_trait]
    impl MirrorClient for CountingMirror {
        async fn token_balance(&self, _account: &AccountId, token: &TokenId) -> Result<u64> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if token.as_str() == "0.0.1001" {
                Ok(self.balance_a.load(Ordering::Relaxed))
            } else {
                Ok(self.balance_b.load(Ordering::Relaxed))
            }
        }

        async fn associated_tokens(&self, _account: &AccountId) -> Result<HashSet<TokenId>> {
            Ok(HashSet::new())
        }
    }

    fn pool() -> Pool {
        Pool::new(PoolKey::new("hUSD-hEUR"), AccountId::new("0.0.5005"), "hUSD", "hEUR", 30)
    }

    #[tokio::test]
    async fn test_read_through_and_hit() {
        let mirror = Arc::new(CountingMirror::new(1_000, 2_000));
        let cache = ReserveCache::new(mirror.clone(), Duration::from_secs(5));
        let (token_a, token_b) = (TokenId::new("0.0.1001"), TokenId::new("0.0.1002"));

        let ttl = Duration::from_secs(60);
        let first = cache.get(&pool(), &token_a, &token_b, ttl).await.unwrap();
        assert_eq!(first, Reserves { reserve_a: 1_000, reserve_b: 2_000 });
        assert_eq!(mirror.calls.load(Ordering::Relaxed), 2);

        // Within the TTL the mirror is not consulted again even if it moved.
        mirror.balance_a.store(9_999, Ordering::Relaxed);
        let second = cache.get(&pool(), &token_a, &token_b, ttl).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(mirror.calls.load(Ordering::Relaxed), 2);
        assert_eq!(cache.stats.hits.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_forces_fresh_read() {
        let mirror = Arc::new(CountingMirror::new(1_000, 2_000));
        let cache = ReserveCache::new(mirror.clone(), Duration::from_secs(5));
        let (token_a, token_b) = (TokenId::new("0.0.1001"), TokenId::new("0.0.1002"));

        cache.get(&pool(), &token_a, &token_b, Duration::from_secs(60)).await.unwrap();
        mirror.balance_a.store(5_000, Ordering::Relaxed);

        let fresh = cache.get(&pool(), &token_a, &token_b, Duration::ZERO).await.unwrap();
        assert_eq!(fresh.reserve_a, 5_000);
    }

    #[tokio::test]
    async fn test_invalidate_drops_entry() {
        let mirror = Arc::new(CountingMirror::new(1_000, 2_000));
        let cache = ReserveCache::new(mirror.clone(), Duration::from_secs(5));
        let (token_a, token_b) = (TokenId::new("0.0.1001"), TokenId::new("0.0.1002"));
        let ttl = Duration::from_secs(60);

        cache.get(&pool(), &token_a, &token_b, ttl).await.unwrap();
        cache.invalidate(pool().pool_key());
        assert!(cache.is_empty());

        mirror.balance_b.store(7_000, Ordering::Relaxed);
        let after = cache.get(&pool(), &token_a, &token_b, ttl).await.unwrap();
        assert_eq!(after.reserve_b, 7_000);
        assert_eq!(cache.stats.invalidations.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_collapse_to_one_fetch() {
        let mirror = Arc::new(CountingMirror::new(1_000, 2_000));
        let cache = Arc::new(ReserveCache::new(mirror.clone(), Duration::from_secs(5)));
        let (token_a, token_b) = (TokenId::new("0.0.1001"), TokenId::new("0.0.1002"));
        let ttl = Duration::from_secs(60);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let (ta, tb) = (token_a.clone(), token_b.clone());
            handles.push(tokio::spawn(async move {
                cache.get(&pool(), &ta, &tb, ttl).await.unwrap()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), Reserves { reserve_a: 1_000, reserve_b: 2_000 });
        }
        // One flight, two balance reads.
        assert_eq!(mirror.calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_mirror_failure_propagates() {
        struct FailingMirror;

        #[async_trait]
        impl MirrorClient for FailingMirror {
            async fn token_balance(&self, _a: &AccountId, _t: &TokenId) -> Result<u64> {
                Err(SwapError::Mirror("503".into()))
            }
            async fn associated_tokens(&self, _a: &AccountId) -> Result<HashSet<TokenId>> {
                Err(SwapError::Mirror("503".into()))
            }
        }

        let cache = ReserveCache::new(Arc::new(FailingMirror), Duration::from_secs(5));
        let result = cache
            .get(&pool(), &TokenId::new("0.0.1001"), &TokenId::new("0.0.1002"), Duration::ZERO)
            .await;
        assert!(matches!(result, Err(SwapError::Mirror(_))));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_oriented() {
        let r = Reserves { reserve_a: 10, reserve_b: 20 };
        assert_eq!(r.oriented(true), (10, 20));
        assert_eq!(r.oriented(false), (20, 10));
    }
}
