//! Cache entity: one remembered computation result

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

/// A stored value with its expiry deadline.
///
/// Created atomically with its value on a cache miss and never mutated;
/// a recomputation under the same fingerprint inserts a fresh entity.
pub(crate) struct CacheEntity {
    value: Arc<dyn Any + Send + Sync>,
    expires_at: Instant,
}

impl CacheEntity {
    pub(crate) fn new(value: Arc<dyn Any + Send + Sync>, expires_at: Instant) -> Self {
        Self { value, expires_at }
    }

    /// An entity is stale once its deadline is strictly in the past.
    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        self.expires_at < now
    }

    pub(crate) fn downcast<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}
