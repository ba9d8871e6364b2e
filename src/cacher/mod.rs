//! Cacher Module
//!
//! The read-through decorator: checks the store, falls back to the producer
//! on a miss, and writes the produced value back before returning it.

mod producer;


use std::fmt;
use std::marker::PhantomData;

use tracing::{debug, warn};

use crate::cache::Cache;
use crate::context::Context;
use crate::error::{CacherError, StoreError};

pub use producer::Producer;

// == Cacher ==
/// Read-through decorator over a [`Cache`] and a [`Producer`].
///
/// Holds no state besides its two collaborators and performs no
/// synchronization: concurrent misses for the same key each call the
/// producer and each write to the store.
pub struct Cacher<K, V, C, P> {
    store: C,
    producer: P,
    _marker: PhantomData<fn(&K) -> V>,
}

impl<K, V, C, P> Clone for Cacher<K, V, C, P>
where
    C: Clone,
    P: Clone,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            producer: self.producer.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K, V, C, P> fmt::Debug for Cacher<K, V, C, P>
where
    C: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cacher")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl<K, V, C, P> Cacher<K, V, C, P>
where
    C: Cache<K, V>,
    P: Producer<K, V>,
    K: fmt::Debug,
    V: fmt::Debug,
{
    // == Constructor ==
    pub fn new(store: C, producer: P) -> Self {
        Self {
            store,
            producer,
            _marker: PhantomData,
        }
    }

    // == Get ==
    /// Returns the value for `key`, computing and caching it on a miss.
    ///
    /// # Errors
    /// - [`CacherError::Retrieval`] if the store read fails with anything but
    ///   `NotFound`; the producer is not consulted.
    /// - [`CacherError::Producer`] with the producer's own error; nothing is
    ///   written.
    /// - [`CacherError::Storage`] if the write-back fails; the error still
    ///   carries the freshly computed value.
    pub async fn get(&self, ctx: &Context, key: &K) -> Result<V, CacherError<V, P::Error>> {
        match self.store.get(ctx, key).await {
            Ok(value) => {
                debug!(key = ?key, "cache hit");
                return Ok(value);
            }
            Err(StoreError::NotFound) => debug!(key = ?key, "cache miss, producing value"),
            Err(err) => {
                warn!(key = ?key, error = %err, "cache read failed");
                return Err(CacherError::Retrieval(err));
            }
        }

        let value = self
            .producer
            .produce(ctx, key)
            .await
            .map_err(|err| {
                debug!(key = ?key, error = %err, "producer failed");
                CacherError::Producer(err)
            })?;

        if let Err(err) = self.store.set(ctx, key, &value).await {
            warn!(
                key = ?key,
                value = ?value,
                error = %err,
                "cache write failed, returning uncached value"
            );
            return Err(CacherError::Storage { value, source: err });
        }

        debug!(key = ?key, "cache filled");
        Ok(value)
    }

    pub fn store(&self) -> &C {
        &self.store
    }

    pub fn producer(&self) -> &P {
        &self.producer
    }

    pub fn into_parts(self) -> (C, P) {
        (self.store, self.producer)
    }
}
