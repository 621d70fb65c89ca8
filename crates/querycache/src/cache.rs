//! QueryCache: TTL memoization over caller-supplied queries

use std::any::type_name;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ahash::RandomState;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::entity::CacheEntity;
use crate::error::{Error, QueryError, Result};
use crate::fingerprint::{fingerprint, QueryArg};
use crate::stats::CacheStats;

type EntryMap = HashMap<String, CacheEntity, RandomState>;

/// TTL memoization cache keyed by query-argument fingerprints.
///
/// Wraps expensive, argument-determined computations ("queries"): the first
/// call with a given argument list runs the query and remembers the result,
/// later calls return the remembered value until it ages past the TTL. A
/// background sweeper removes aged entries at every TTL interval.
pub struct QueryCache<R> {
    /// Resource the cached queries run against. Carried for future
    /// extensibility; no cache operation consults it.
    resource: R,

    /// Entry lifetime; doubles as the sweep interval.
    ttl: Duration,

    /// Fingerprint -> entity table, shared with the sweeper.
    entries: Arc<RwLock<EntryMap>>,

    /// Cache statistics
    stats: Arc<CacheStats>,
}

impl<R> QueryCache<R> {
    /// Create a cache and start its expiry sweeper.
    ///
    /// # Arguments
    /// * `ctx` - Cancelling this token stops the sweeper; stored entries stay put
    /// * `resource` - Handle the cached queries run against
    /// * `ttl` - Entry lifetime and sweep interval; must be non-zero
    ///
    /// # Returns
    /// * `Result<QueryCache<R>>` - The running cache
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime; the sweeper task is spawned
    /// on the ambient runtime.
    pub fn new(ctx: &CancellationToken, resource: R, ttl: Duration) -> Result<Self> {
        if ttl.is_zero() {
            return Err(Error::InvalidTtl);
        }

        let cache = Self {
            resource,
            ttl,
            entries: Arc::new(RwLock::new(EntryMap::default())),
            stats: Arc::new(CacheStats::new()),
        };
        cache.spawn_sweeper(ctx);

        Ok(cache)
    }

    /// Return the cached value for `args`, or run `query` and cache its result.
    ///
    /// `args` only identify the call; the query captures whatever it needs.
    /// The query runs without the store lock held, so concurrent calls that
    /// miss on the same fingerprint may each invoke it (last insert wins).
    /// A failed query caches nothing and the next call retries.
    ///
    /// # Arguments
    /// * `query` - Computation to run on a miss
    /// * `args` - Argument values identifying the call
    pub fn get_or_compute<T, Q>(&self, query: Q, args: &[&dyn QueryArg]) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        Q: FnOnce() -> std::result::Result<T, QueryError>,
    {
        let key = fingerprint(args)?;
        if let Some(value) = self.lookup(&key)? {
            return Ok(value);
        }

        let value = query().map_err(Error::Query)?;
        self.insert(key, &value);

        Ok(value)
    }

    /// Context-aware form of [`get_or_compute`](Self::get_or_compute).
    ///
    /// On a miss the query receives a clone of `ctx`. The cache itself does
    /// not watch the token: an in-flight query runs to completion and
    /// cancellation is the query's own business. The query must not retain
    /// the token beyond its own call.
    ///
    /// # Arguments
    /// * `ctx` - Token forwarded to the query
    /// * `query` - Computation to run on a miss
    /// * `args` - Argument values identifying the call
    pub async fn get_or_compute_context<T, Q, Fut>(
        &self,
        ctx: &CancellationToken,
        query: Q,
        args: &[&dyn QueryArg],
    ) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        Q: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = std::result::Result<T, QueryError>>,
    {
        let key = fingerprint(args)?;
        if let Some(value) = self.lookup(&key)? {
            return Ok(value);
        }

        let value = query(ctx.clone()).await.map_err(Error::Query)?;
        self.insert(key, &value);

        Ok(value)
    }

    /// Number of stored entries, counting stale ones the sweeper has not
    /// removed yet
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Configured entry lifetime / sweep interval
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Underlying resource handle
    pub fn resource(&self) -> &R {
        &self.resource
    }

    // Hit path. A present-but-stale entry counts as a miss: removal stays the
    // sweeper's job, the fresh insert simply overwrites it.
    fn lookup<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.entries.read();
        match entries.get(key) {
            Some(entity) if !entity.is_expired(Instant::now()) => {
                match entity.downcast::<T>() {
                    Some(value) => {
                        self.stats.record_hit();
                        Ok(Some(value.clone()))
                    }
                    None => Err(Error::ValueType {
                        expected: type_name::<T>(),
                    }),
                }
            }
            _ => {
                self.stats.record_miss();
                Ok(None)
            }
        }
    }

    fn insert<T>(&self, key: String, value: &T)
    where
        T: Clone + Send + Sync + 'static,
    {
        let entity = CacheEntity::new(Arc::new(value.clone()), Instant::now() + self.ttl);
        self.entries.write().insert(key, entity);
        self.stats.record_insert();
    }

    fn spawn_sweeper(&self, ctx: &CancellationToken) {
        let entries = Arc::clone(&self.entries);
        let stats = Arc::clone(&self.stats);
        let ctx = ctx.clone();
        let period = self.ttl;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick fires immediately; wait a full period instead
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ctx.cancelled() => break,
                    _ = ticker.tick() => {
                        let keys = outdated_keys(&entries);
                        if !keys.is_empty() {
                            let removed = keys.len() as u64;
                            flush(&entries, keys);
                            stats.record_expirations(removed);
                            debug!(removed, "swept expired entries");
                        }
                    }
                }
            }

            debug!("expiry sweeper stopped");
        });
    }
}

/// Keys whose deadline has passed, collected under the read lock only.
fn outdated_keys(entries: &RwLock<EntryMap>) -> Vec<String> {
    let now = Instant::now();
    entries
        .read()
        .iter()
        .filter(|(_, entity)| entity.is_expired(now))
        .map(|(key, _)| key.clone())
        .collect()
}

/// Remove exactly `keys`, under the write lock only.
fn flush(entries: &RwLock<EntryMap>, keys: Vec<String>) {
    let mut map = entries.write();
    for key in keys {
        map.remove(&key);
    }
}
