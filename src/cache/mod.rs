//! Cache Module
//!
//! Defines the [`Cache`] capability the read-through decorator wraps, plus
//! an in-process map-backed implementation with optional expiration.

mod entry;
mod expiration;
mod stats;
mod store;

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::StoreResult;

// Re-export public types
pub use entry::CacheEntry;
pub use expiration::{Expiration, MAX_RELATIVE_EXPIRATION_SECS};
pub use stats::CacheStats;
pub use store::MemoryStore;

// == Cache Capability ==
/// Abstract get/set interface over a key-value backend.
///
/// Implementations must return [`StoreError::NotFound`](crate::error::StoreError::NotFound)
/// from `get` when the key is absent. Any other error is treated as a
/// malfunction by [`Cacher`](crate::cacher::Cacher).
///
/// `set` may be best-effort (an add-if-absent primitive is fine), but its
/// failures must be surfaced rather than swallowed.
#[async_trait]
pub trait Cache<K, V>: Send + Sync {
    /// Looks up `key`.
    async fn get(&self, ctx: &Context, key: &K) -> StoreResult<V>;

    /// Associates `value` with `key`.
    async fn set(&self, ctx: &Context, key: &K, value: &V) -> StoreResult<()>;
}

#[async_trait]
impl<K, V, C> Cache<K, V> for Arc<C>
where
    C: Cache<K, V> + ?Sized,
    K: Sync,
    V: Send + Sync,
{
    async fn get(&self, ctx: &Context, key: &K) -> StoreResult<V> {
        (**self).get(ctx, key).await
    }

    async fn set(&self, ctx: &Context, key: &K, value: &V) -> StoreResult<()> {
        (**self).set(ctx, key, value).await
    }
}

#[async_trait]
impl<'a, K, V, C> Cache<K, V> for &'a C
where
    C: Cache<K, V> + ?Sized,
    K: Sync,
    V: Send + Sync,
{
    async fn get(&self, ctx: &Context, key: &K) -> StoreResult<V> {
        (**self).get(ctx, key).await
    }

    async fn set(&self, ctx: &Context, key: &K, value: &V) -> StoreResult<()> {
        (**self).set(ctx, key, value).await
    }
}
