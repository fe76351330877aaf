//! Derived counter and membership-flag cache.
//!
//! The counter store holds aggregate values (like counts, follower counts,
//! reply counts) and per-user membership flags derived from the reaction
//! ledger, plus serialized pages of paginated listings. Entries live forever
//! until a write path explicitly adjusts or deletes them; the ledger stays
//! the source of truth and a cold key is re-derived on the next read.
//!
//! Two backends are provided: [`RedisCounterStore`] for production and
//! [`MemoryCounterStore`] for tests and single-process deployments.

use async_trait::async_trait;
use fred::clients::Client as RedisClient;
use fred::interfaces::KeysInterface;
use fred::types::scan::Scanner;
use fred::types::Expiration;
use futures::TryStreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Cache key builders for the counter store.
///
/// Collisions are prevented by convention only: count metrics (`likes`,
/// `followers`, `comments`, `replies`) and per-user flag names (`liked`,
/// `followed`, `commented`) are deliberately distinct suffixes.
pub mod keys {
    /// Key for an aggregate count: `{target}:{id}:{metric}`.
    #[must_use]
    pub fn count(target: &str, id: &str, metric: &str) -> String {
        format!("{target}:{id}:{metric}")
    }

    /// Key for a per-user membership flag: `{target}:{id}:{flag}:{user_id}`.
    #[must_use]
    pub fn flag(target: &str, id: &str, flag: &str, user_id: &str) -> String {
        format!("{target}:{id}:{flag}:{user_id}")
    }

    /// Key for one cached listing page.
    #[must_use]
    pub fn page(target: &str, id: &str, metric: &str, page: u64, per_page: u64) -> String {
        format!("{target}:{id}:{metric}:pagination:{page}:{per_page}")
    }

    /// Prefix covering every cached page of a listing, for pattern deletes.
    #[must_use]
    pub fn page_prefix(target: &str, id: &str, metric: &str) -> String {
        format!("{target}:{id}:{metric}:pagination:")
    }

    /// Key for a popularity aggregate: `popularity:{name}`.
    #[must_use]
    pub fn popularity(name: &str) -> String {
        format!("popularity:{name}")
    }
}

/// Backend contract for the counter store.
///
/// `increment` on an absent key creates it at 1; the read path re-derives
/// absolute values from the ledger on a miss, so no backend needs to seed
/// counters itself. `forget_by_prefix` is best-effort: a backend without
/// scan support surfaces an error and the caller decides whether that
/// failure is fatal.
#[async_trait]
pub trait CounterBackend: Send + Sync {
    /// Get a counter value. `None` means the key is absent.
    async fn get(&self, key: &str) -> AppResult<Option<i64>>;

    /// Set a counter value with no expiry.
    async fn set(&self, key: &str, value: i64) -> AppResult<()>;

    /// Get a membership flag. `None` means unknown, not false.
    async fn get_flag(&self, key: &str) -> AppResult<Option<bool>>;

    /// Set a membership flag with no expiry.
    async fn set_flag(&self, key: &str, value: bool) -> AppResult<()>;

    /// Get a serialized JSON payload (cached listing page or aggregate).
    async fn get_json(&self, key: &str) -> AppResult<Option<serde_json::Value>>;

    /// Store a JSON payload with no expiry.
    async fn set_json(&self, key: &str, value: &serde_json::Value) -> AppResult<()>;

    /// Store a JSON payload with a bounded lifetime.
    async fn set_json_with_ttl(
        &self,
        key: &str,
        value: &serde_json::Value,
        ttl: Duration,
    ) -> AppResult<()>;

    /// Atomically increment a counter, creating an absent key at 1.
    async fn increment(&self, key: &str) -> AppResult<i64>;

    /// Atomically decrement a counter.
    async fn decrement(&self, key: &str) -> AppResult<i64>;

    /// Remove a single key.
    async fn forget(&self, key: &str) -> AppResult<()>;

    /// Remove every key under a prefix, returning how many were deleted.
    async fn forget_by_prefix(&self, prefix: &str) -> AppResult<u64>;
}

/// Shared handle to a counter store backend.
pub type CounterStore = Arc<dyn CounterBackend>;

/// SCAN page size for prefix deletes.
const SCAN_PAGE_SIZE: u32 = 100;

/// Redis-backed counter store.
#[derive(Clone)]
pub struct RedisCounterStore {
    redis: Arc<RedisClient>,
    prefix: String,
}

impl RedisCounterStore {
    /// Create a new Redis counter store. All keys are namespaced under
    /// `{prefix}:`.
    #[must_use]
    pub fn new(redis: Arc<RedisClient>, prefix: impl Into<String>) -> Self {
        Self {
            redis,
            prefix: prefix.into(),
        }
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}:{key}", self.prefix)
    }
}

#[async_trait]
impl CounterBackend for RedisCounterStore {
    async fn get(&self, key: &str) -> AppResult<Option<i64>> {
        self.redis
            .get(self.namespaced(key))
            .await
            .map_err(|e| AppError::Cache(e.to_string()))
    }

    async fn set(&self, key: &str, value: i64) -> AppResult<()> {
        self.redis
            .set::<(), _, _>(self.namespaced(key), value, None, None, false)
            .await
            .map_err(|e| AppError::Cache(e.to_string()))
    }

    async fn get_flag(&self, key: &str) -> AppResult<Option<bool>> {
        let value: Option<i64> = self
            .redis
            .get(self.namespaced(key))
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;
        Ok(value.map(|v| v != 0))
    }

    async fn set_flag(&self, key: &str, value: bool) -> AppResult<()> {
        self.redis
            .set::<(), _, _>(self.namespaced(key), i64::from(value), None, None, false)
            .await
            .map_err(|e| AppError::Cache(e.to_string()))
    }

    async fn get_json(&self, key: &str) -> AppResult<Option<serde_json::Value>> {
        let raw: Option<String> = self
            .redis
            .get(self.namespaced(key))
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;

        raw.map(|json_str| {
            serde_json::from_str(&json_str).map_err(|e| AppError::Cache(e.to_string()))
        })
        .transpose()
    }

    async fn set_json(&self, key: &str, value: &serde_json::Value) -> AppResult<()> {
        let json_str =
            serde_json::to_string(value).map_err(|e| AppError::Cache(e.to_string()))?;
        self.redis
            .set::<(), _, _>(self.namespaced(key), json_str, None, None, false)
            .await
            .map_err(|e| AppError::Cache(e.to_string()))
    }

    async fn set_json_with_ttl(
        &self,
        key: &str,
        value: &serde_json::Value,
        ttl: Duration,
    ) -> AppResult<()> {
        let json_str =
            serde_json::to_string(value).map_err(|e| AppError::Cache(e.to_string()))?;
        self.redis
            .set::<(), _, _>(
                self.namespaced(key),
                json_str,
                Some(Expiration::EX(ttl.as_secs() as i64)),
                None,
                false,
            )
            .await
            .map_err(|e| AppError::Cache(e.to_string()))
    }

    async fn increment(&self, key: &str) -> AppResult<i64> {
        self.redis
            .incr(self.namespaced(key))
            .await
            .map_err(|e| AppError::Cache(e.to_string()))
    }

    async fn decrement(&self, key: &str) -> AppResult<i64> {
        self.redis
            .decr(self.namespaced(key))
            .await
            .map_err(|e| AppError::Cache(e.to_string()))
    }

    async fn forget(&self, key: &str) -> AppResult<()> {
        self.redis
            .del::<(), _>(self.namespaced(key))
            .await
            .map_err(|e| AppError::Cache(e.to_string()))
    }

    async fn forget_by_prefix(&self, prefix: &str) -> AppResult<u64> {
        let pattern = format!("{}*", self.namespaced(prefix));
        let mut scan_stream = self.redis.scan(pattern, Some(SCAN_PAGE_SIZE), None);

        let mut removed = 0u64;
        while let Some(mut page) = scan_stream
            .try_next()
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?
        {
            if let Some(page_keys) = page.take_results()
                && !page_keys.is_empty()
            {
                removed += page_keys.len() as u64;
                self.redis
                    .del::<(), _>(page_keys)
                    .await
                    .map_err(|e| AppError::Cache(e.to_string()))?;
            }
            let _ = page.next();
        }

        debug!(prefix = %prefix, removed = removed, "Pattern-deleted cached keys");
        Ok(removed)
    }
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Instant::now())
    }
}

/// In-memory counter store.
///
/// Mirrors the Redis backend's string-typed storage so `increment` behaves
/// identically (absent or non-numeric keys start from 0). Used in tests and
/// as a fallback when no Redis instance is configured.
#[derive(Clone, Default)]
pub struct MemoryCounterStore {
    entries: Arc<RwLock<HashMap<String, MemoryEntry>>>,
}

impl MemoryCounterStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_live(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone())
    }

    async fn write(&self, key: &str, value: String, ttl: Option<Duration>) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value,
                expires_at: ttl.map(|t| Instant::now() + t),
            },
        );
    }

    async fn adjust(&self, key: &str, delta: i64) -> i64 {
        let mut entries = self.entries.write().await;
        let current = entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .and_then(|entry| entry.value.parse::<i64>().ok())
            .unwrap_or(0);
        let next = current + delta;
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: next.to_string(),
                expires_at: None,
            },
        );
        next
    }
}

#[async_trait]
impl CounterBackend for MemoryCounterStore {
    async fn get(&self, key: &str) -> AppResult<Option<i64>> {
        Ok(self.read_live(key).await.and_then(|v| v.parse().ok()))
    }

    async fn set(&self, key: &str, value: i64) -> AppResult<()> {
        self.write(key, value.to_string(), None).await;
        Ok(())
    }

    async fn get_flag(&self, key: &str) -> AppResult<Option<bool>> {
        Ok(self
            .read_live(key)
            .await
            .and_then(|v| v.parse::<i64>().ok())
            .map(|v| v != 0))
    }

    async fn set_flag(&self, key: &str, value: bool) -> AppResult<()> {
        self.write(key, i64::from(value).to_string(), None).await;
        Ok(())
    }

    async fn get_json(&self, key: &str) -> AppResult<Option<serde_json::Value>> {
        self.read_live(key)
            .await
            .map(|raw| serde_json::from_str(&raw).map_err(|e| AppError::Cache(e.to_string())))
            .transpose()
    }

    async fn set_json(&self, key: &str, value: &serde_json::Value) -> AppResult<()> {
        let json_str =
            serde_json::to_string(value).map_err(|e| AppError::Cache(e.to_string()))?;
        self.write(key, json_str, None).await;
        Ok(())
    }

    async fn set_json_with_ttl(
        &self,
        key: &str,
        value: &serde_json::Value,
        ttl: Duration,
    ) -> AppResult<()> {
        let json_str =
            serde_json::to_string(value).map_err(|e| AppError::Cache(e.to_string()))?;
        self.write(key, json_str, Some(ttl)).await;
        Ok(())
    }

    async fn increment(&self, key: &str) -> AppResult<i64> {
        Ok(self.adjust(key, 1).await)
    }

    async fn decrement(&self, key: &str) -> AppResult<i64> {
        Ok(self.adjust(key, -1).await)
    }

    async fn forget(&self, key: &str) -> AppResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn forget_by_prefix(&self, prefix: &str) -> AppResult<u64> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }
}

/// A backend that rejects pattern deletes.
///
/// Wraps another backend and fails `forget_by_prefix`, mirroring a cache
/// deployment whose store has no scan capability. Exists so callers of the
/// best-effort invalidation path can be exercised against that failure mode.
#[derive(Clone)]
pub struct NoScanCounterStore<B> {
    inner: B,
}

impl<B: CounterBackend> NoScanCounterStore<B> {
    /// Wrap a backend, disabling prefix deletes.
    pub const fn new(inner: B) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<B: CounterBackend> CounterBackend for NoScanCounterStore<B> {
    async fn get(&self, key: &str) -> AppResult<Option<i64>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: i64) -> AppResult<()> {
        self.inner.set(key, value).await
    }

    async fn get_flag(&self, key: &str) -> AppResult<Option<bool>> {
        self.inner.get_flag(key).await
    }

    async fn set_flag(&self, key: &str, value: bool) -> AppResult<()> {
        self.inner.set_flag(key, value).await
    }

    async fn get_json(&self, key: &str) -> AppResult<Option<serde_json::Value>> {
        self.inner.get_json(key).await
    }

    async fn set_json(&self, key: &str, value: &serde_json::Value) -> AppResult<()> {
        self.inner.set_json(key, value).await
    }

    async fn set_json_with_ttl(
        &self,
        key: &str,
        value: &serde_json::Value,
        ttl: Duration,
    ) -> AppResult<()> {
        self.inner.set_json_with_ttl(key, value, ttl).await
    }

    async fn increment(&self, key: &str) -> AppResult<i64> {
        self.inner.increment(key).await
    }

    async fn decrement(&self, key: &str) -> AppResult<i64> {
        self.inner.decrement(key).await
    }

    async fn forget(&self, key: &str) -> AppResult<()> {
        self.inner.forget(key).await
    }

    async fn forget_by_prefix(&self, _prefix: &str) -> AppResult<u64> {
        Err(AppError::Cache(
            "pattern delete unsupported by this cache backend".to_string(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_count_key() {
        assert_eq!(keys::count("article", "42", "likes"), "article:42:likes");
    }

    #[test]
    fn test_flag_key() {
        assert_eq!(
            keys::flag("article", "42", "liked", "u1"),
            "article:42:liked:u1"
        );
    }

    #[test]
    fn test_page_key() {
        assert_eq!(
            keys::page("article", "42", "comments", 1, 10),
            "article:42:comments:pagination:1:10"
        );
    }

    #[test]
    fn test_page_prefix_covers_page_keys() {
        let prefix = keys::page_prefix("article", "42", "comments");
        assert!(keys::page("article", "42", "comments", 3, 25).starts_with(&prefix));
    }

    #[tokio::test]
    async fn test_memory_increment_creates_at_one() {
        let store = MemoryCounterStore::new();
        let value = store.increment("article:1:likes").await.unwrap();
        assert_eq!(value, 1);
        assert_eq!(store.get("article:1:likes").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_memory_increment_decrement() {
        let store = MemoryCounterStore::new();
        store.set("article:1:likes", 5).await.unwrap();
        assert_eq!(store.increment("article:1:likes").await.unwrap(), 6);
        assert_eq!(store.decrement("article:1:likes").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_memory_flag_absent_is_unknown() {
        let store = MemoryCounterStore::new();
        assert_eq!(store.get_flag("article:1:liked:u1").await.unwrap(), None);

        store.set_flag("article:1:liked:u1", false).await.unwrap();
        assert_eq!(
            store.get_flag("article:1:liked:u1").await.unwrap(),
            Some(false)
        );
    }

    #[tokio::test]
    async fn test_memory_forget_by_prefix() {
        let store = MemoryCounterStore::new();
        store
            .set_json(
                &keys::page("article", "1", "comments", 1, 10),
                &serde_json::json!([]),
            )
            .await
            .unwrap();
        store
            .set_json(
                &keys::page("article", "1", "comments", 2, 10),
                &serde_json::json!([]),
            )
            .await
            .unwrap();
        store.set("article:1:comments", 12).await.unwrap();

        let removed = store
            .forget_by_prefix(&keys::page_prefix("article", "1", "comments"))
            .await
            .unwrap();

        assert_eq!(removed, 2);
        // The aggregate count is untouched by the pattern delete.
        assert_eq!(store.get("article:1:comments").await.unwrap(), Some(12));
    }

    #[tokio::test]
    async fn test_memory_ttl_expiry() {
        let store = MemoryCounterStore::new();
        store
            .set_json_with_ttl(
                "popularity:tags",
                &serde_json::json!(["rust"]),
                Duration::from_secs(0),
            )
            .await
            .unwrap();

        assert_eq!(store.get_json("popularity:tags").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_noscan_rejects_pattern_delete() {
        let store = NoScanCounterStore::new(MemoryCounterStore::new());
        store.increment("article:1:comments").await.unwrap();

        let result = store.forget_by_prefix("article:1:comments:pagination:").await;
        assert!(result.is_err());
        // Plain key operations still work.
        assert_eq!(store.get("article:1:comments").await.unwrap(), Some(1));
    }
}
