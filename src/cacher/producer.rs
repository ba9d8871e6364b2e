//! Producer Capability
//!
//! The fallback computation a [`Cacher`](super::Cacher) invokes on a miss.

use std::future::Future;

use async_trait::async_trait;

use crate::context::Context;

// == Producer ==
/// Supplies the authoritative value for a key.
///
/// May be called concurrently and redundantly for the same key; repeated
/// calls are expected to yield equivalent values.
#[async_trait]
pub trait Producer<K, V>: Send + Sync {
    /// Error surfaced to callers unchanged when production fails.
    type Error: std::error::Error + Send + Sync + 'static;

    async fn produce(&self, ctx: &Context, key: &K) -> Result<V, Self::Error>;
}

/// Any `Fn(Context, K) -> impl Future<Output = Result<V, E>>` is a producer,
/// so plain async closures can be handed to a cacher.
#[async_trait]
impl<K, V, E, F, Fut> Producer<K, V> for F
where
    F: Fn(Context, K) -> Fut + Send + Sync,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
    K: Clone + Send + Sync,
    V: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    async fn produce(&self, ctx: &Context, key: &K) -> Result<V, E> {
        (self)(*ctx, key.clone()).await
    }
}
