//! Key-value store contract and the in-process store
//!
//! The advisor only needs three operations from a store: read a value,
//! write one with a time-to-live, and delete one. Values cross the store
//! boundary as serialized JSON text.

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crate::{CacheConfig, CacheError};

/// Minimal key-value contract used by the advisor
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Fetch the value for `key`, or `None` if absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, replacing any existing value.
    ///
    /// How a zero `ttl` is treated is up to the store.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Remove `key`; absent keys are not an error
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

#[async_trait]
impl<S: CacheStore + ?Sized> CacheStore for Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        (**self).set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        (**self).delete(key).await
    }
}

#[derive(Debug, Clone)]
struct StoredEntry {
    payload: Arc<str>,
    ttl: Option<Duration>,
}

/// Expires each entry after the TTL it was written with
struct PerEntryTtl;

impl Expiry<String, StoredEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// Bounded in-process store backed by Moka.
///
/// A zero TTL stores the entry without expiry.
#[derive(Clone)]
pub struct MokaStore {
    entries: Cache<String, StoredEntry>,
}

impl MokaStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_capacity(config.local_max_capacity)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { entries }
    }
}

impl Default for MokaStore {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

#[async_trait]
impl CacheStore for MokaStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self
            .entries
            .get(key)
            .await
            .map(|entry| entry.payload.to_string()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let entry = StoredEntry {
            payload: Arc::from(value),
            ttl: (!ttl.is_zero()).then_some(ttl),
        };
        self.entries.insert(key.to_owned(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.invalidate(key).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MokaStore::default();

        assert_eq!(store.get("k").await.ok(), Some(None));

        store
            .set("k", "\"v1\"".to_owned(), Duration::from_secs(60))
            .await
            .expect("set");
        assert_eq!(store.get("k").await.ok(), Some(Some("\"v1\"".to_owned())));

        store
            .set("k", "\"v2\"".to_owned(), Duration::from_secs(60))
            .await
            .expect("overwrite");
        assert_eq!(store.get("k").await.ok(), Some(Some("\"v2\"".to_owned())));

        store.delete("k").await.expect("delete");
        assert_eq!(store.get("k").await.ok(), Some(None));

        // Deleting an absent key is fine
        store.delete("missing").await.expect("delete absent");
    }

    #[tokio::test]
    async fn test_entries_expire_after_their_ttl() {
        let store = MokaStore::with_capacity(16);
        store
            .set("short", "1".to_owned(), Duration::from_millis(50))
            .await
            .expect("set");
        store
            .set("forever", "2".to_owned(), Duration::ZERO)
            .await
            .expect("set");

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(store.get("short").await.ok(), Some(None));
        assert_eq!(store.get("forever").await.ok(), Some(Some("2".to_owned())));
    }

    #[tokio::test]
    async fn test_shared_store_through_arc() {
        let store = Arc::new(MokaStore::default());
        let shared: Arc<dyn CacheStore> = store.clone();
        shared
            .set("k", "1".to_owned(), Duration::from_secs(5))
            .await
            .expect("set");
        assert_eq!(store.get("k").await.ok(), Some(Some("1".to_owned())));
    }
}
