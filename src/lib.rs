//! Read-through caching over pluggable key-value stores
//!
//! A [`Cacher`] wraps a [`Cache`] and a [`Producer`]: lookups are served from
//! the store when possible and otherwise computed, written back, and returned.
//! Ships with an in-memory store and a memcached-backed store.

pub mod cache;
pub mod cacher;
pub mod config;
pub mod context;
pub mod error;
pub mod memcached;

pub use cache::{Cache, Expiration, MemoryStore};
pub use cacher::{Cacher, Producer};
pub use config::MemcachedConfig;
pub use context::Context;
pub use error::{CacherError, StoreError, StoreResult};
pub use memcached::Memcached;
