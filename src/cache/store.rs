//! Memory Store Module
//!
//! In-process [`Cache`] implementation over a HashMap. It never evicts:
//! when a capacity limit is configured, writes of new keys are refused
//! once the limit is reached.

use std::collections::HashMap;
use std::hash::Hash;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::{Cache, CacheEntry, CacheStats, Expiration};
use crate::context::Context;
use crate::error::{StoreError, StoreResult};

#[derive(Debug)]
struct Inner<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    stats: CacheStats,
}

// == Memory Store ==
/// Map-backed store with optional capacity limit and expiration.
#[derive(Debug)]
pub struct MemoryStore<K, V> {
    inner: RwLock<Inner<K, V>>,
    /// Maximum number of entries, None = unbounded
    max_entries: Option<usize>,
    /// Expiration applied to every write
    expiration: Expiration,
}

impl<K, V> Default for MemoryStore<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MemoryStore<K, V>
where
    K: Eq + Hash,
{
    // == Constructor ==
    /// Creates an unbounded store whose entries never expire.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: HashMap::new(),
                stats: CacheStats::new(),
            }),
            max_entries: None,
            expiration: Expiration::Never,
        }
    }

    /// Refuses writes of new keys once `max_entries` are stored.
    pub fn with_capacity_limit(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Applies `expiration` to every subsequent write.
    pub fn with_expiration(mut self, expiration: Expiration) -> Self {
        self.expiration = expiration;
        self
    }

    pub fn expiration(&self) -> Expiration {
        self.expiration
    }

    // == Length ==
    /// Returns the number of stored entries, expired ones included until purged.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    /// Returns true if a live entry exists for `key`.
    pub async fn contains_key(&self, key: &K) -> bool {
        self.inner
            .read()
            .await
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    // == Remove ==
    /// Removes an entry, returning its value if it was present and live.
    pub async fn remove(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.write().await;
        let removed = inner.entries.remove(key);
        let len = inner.entries.len();
        inner.stats.set_total_entries(len);
        removed
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value)
    }

    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.stats.set_total_entries(0);
    }

    // == Purge Expired ==
    /// Removes all expired entries.
    ///
    /// Returns the number of entries removed.
    pub async fn purge_expired(&self) -> usize {
        let mut inner = self.inner.write().await;
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired());
        let len = inner.entries.len();
        inner.stats.set_total_entries(len);
        before - len
    }

    // == Stats ==
    /// Returns current store statistics.
    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.read().await;
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.entries.len());
        stats
    }
}

#[async_trait]
impl<K, V> Cache<K, V> for MemoryStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    // == Get ==
    /// Returns the live value for `key`.
    ///
    /// Expired entries are removed and reported as `NotFound`.
    async fn get(&self, _ctx: &Context, key: &K) -> StoreResult<V> {
        let mut inner = self.inner.write().await;

        let lookup = inner
            .entries
            .get(key)
            .map(|entry| (!entry.is_expired()).then(|| entry.value.clone()));

        match lookup {
            Some(Some(value)) => {
                inner.stats.record_hit();
                return Ok(value);
            }
            Some(None) => {
                inner.entries.remove(key);
                let len = inner.entries.len();
                inner.stats.set_total_entries(len);
            }
            None => {}
        }
        inner.stats.record_miss();
        Err(StoreError::NotFound)
    }

    // == Set ==
    /// Stores `value` under `key`, overwriting any previous entry.
    async fn set(&self, _ctx: &Context, key: &K, value: &V) -> StoreResult<()> {
        let mut inner = self.inner.write().await;

        let is_overwrite = inner.entries.contains_key(key);
        if let Some(max_entries) = self.max_entries {
            if !is_overwrite && inner.entries.len() >= max_entries {
                // expired entries do not count against the limit
                inner.entries.retain(|_, entry| !entry.is_expired());
                if inner.entries.len() >= max_entries {
                    inner.stats.record_rejected_write();
                    return Err(StoreError::CacheFull(format!(
                        "store holds the maximum of {} entries",
                        max_entries
                    )));
                }
            }
        }

        let entry = CacheEntry::new(value.clone(), &self.expiration);
        inner.entries.insert(key.clone(), entry);
        inner.stats.record_write();
        let len = inner.entries.len();
        inner.stats.set_total_entries(len);

        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ctx() -> Context {
        Context::background()
    }

    #[tokio::test]
    async fn test_store_new() {
        let store: MemoryStore<String, String> = MemoryStore::new();
        assert_eq!(store.len().await, 0);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_set_and_get() {
        let store = MemoryStore::new();
        let key = "key1".to_string();

        store.set(&ctx(), &key, &"value1".to_string()).await.unwrap();
        let value = store.get(&ctx(), &key).await.unwrap();

        assert_eq!(value, "value1");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_store_get_nonexistent() {
        let store: MemoryStore<String, String> = MemoryStore::new();

        let result = store.get(&ctx(), &"nonexistent".to_string()).await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn test_store_overwrite() {
        let store = MemoryStore::new();

        store.set(&ctx(), &1u32, &"first").await.unwrap();
        store.set(&ctx(), &1u32, &"second").await.unwrap();

        assert_eq!(store.get(&ctx(), &1).await.unwrap(), "second");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_store_remove_and_clear() {
        let store = MemoryStore::new();
        store.set(&ctx(), &"a", &1).await.unwrap();
        store.set(&ctx(), &"b", &2).await.unwrap();

        assert_eq!(store.remove(&"a").await, Some(1));
        assert_eq!(store.remove(&"a").await, None);
        assert!(!store.contains_key(&"a").await);
        assert!(store.contains_key(&"b").await);

        store.clear().await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_capacity_limit_refuses_new_keys() {
        let store = MemoryStore::new().with_capacity_limit(2);

        store.set(&ctx(), &"k1", &1).await.unwrap();
        store.set(&ctx(), &"k2", &2).await.unwrap();

        let result = store.set(&ctx(), &"k3", &3).await;
        assert!(matches!(result, Err(StoreError::CacheFull(_))));

        // Overwrites are still accepted at capacity
        store.set(&ctx(), &"k1", &10).await.unwrap();
        assert_eq!(store.get(&ctx(), &"k1").await.unwrap(), 10);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_store_expiration() {
        let store = MemoryStore::new().with_expiration(Expiration::After(Duration::from_millis(50)));
        store.set(&ctx(), &"key", &"value").await.unwrap();

        assert_eq!(store.get(&ctx(), &"key").await.unwrap(), "value");

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(matches!(
            store.get(&ctx(), &"key").await,
            Err(StoreError::NotFound)
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_purge_expired() {
        let past = chrono::Utc::now() - chrono::Duration::seconds(1);
        let store = MemoryStore::new().with_expiration(Expiration::At(past));
        store.set(&ctx(), &"gone1", &1).await.unwrap();
        store.set(&ctx(), &"gone2", &2).await.unwrap();

        assert_eq!(store.len().await, 2);
        assert_eq!(store.purge_expired().await, 2);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_expired_entries_free_capacity() {
        let past = chrono::Utc::now() - chrono::Duration::seconds(1);
        let store = MemoryStore::new()
            .with_capacity_limit(1)
            .with_expiration(Expiration::At(past));
        store.set(&ctx(), &"old", &1).await.unwrap();

        // The expired entry is dropped to make room
        assert!(store.set(&ctx(), &"new", &2).await.is_ok());
    }

    #[tokio::test]
    async fn test_store_stats() {
        let store = MemoryStore::new().with_capacity_limit(1);

        store.set(&ctx(), &"key1", &"value1").await.unwrap();
        store.get(&ctx(), &"key1").await.unwrap();
        let _ = store.get(&ctx(), &"nonexistent").await;
        let _ = store.set(&ctx(), &"key2", &"value2").await;

        let stats = store.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.rejected_writes, 1);
        assert_eq!(stats.total_entries, 1);
    }
}
