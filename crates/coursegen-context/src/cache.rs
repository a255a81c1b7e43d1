//! Bounded cache for external search context

use cached::{Cached, TimedSizedCache};
use coursegen_prompt::Language;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Cache key: the search query and the language it was made in
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextKey {
    pub query: String,
    pub language: String,
}

impl ContextKey {
    pub fn new(query: impl Into<String>, language: &Language) -> Self {
        Self {
            query: query.into(),
            language: language.code().to_string(),
        }
    }
}

/// Thread-safe cache of combined search text.
///
/// Entries expire after a fixed lifespan and the least recently used entry
/// is evicted once the capacity is reached. Clones share the same storage.
#[derive(Clone)]
pub struct ContextCache {
    cache: Arc<Mutex<TimedSizedCache<ContextKey, String>>>,
}

impl ContextCache {
    /// Create a cache holding at most `capacity` entries for `ttl` each
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: Arc::new(Mutex::new(TimedSizedCache::with_size_and_lifespan(
                capacity.max(1),
                ttl,
            ))),
        }
    }

    pub async fn get(&self, key: &ContextKey) -> Option<String> {
        let mut cache = self.cache.lock().await;
        cache.cache_get(key).cloned()
    }

    pub async fn insert(&self, key: ContextKey, value: String) {
        let mut cache = self.cache.lock().await;
        let _ = cache.cache_set(key, value);
    }

    /// Return the cached text for `key`, or compute it with `fetcher`.
    ///
    /// Empty text is returned but not stored, so a transient outage of every
    /// source is retried on the next call.
    pub async fn get_or_fetch<F, Fut>(&self, key: ContextKey, fetcher: F) -> String
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = String>,
    {
        if let Some(value) = self.get(&key).await {
            tracing::debug!(query = %key.query, language = %key.language, "Context cache hit");
            return value;
        }

        tracing::debug!(query = %key.query, language = %key.language, "Context cache miss");
        let value = fetcher().await;

        if !value.is_empty() {
            self.insert(key, value.clone()).await;
        }
        value
    }

    pub async fn invalidate(&self, key: &ContextKey) {
        let mut cache = self.cache.lock().await;
        let _ = cache.cache_remove(key);
    }

    pub async fn clear(&self) {
        let mut cache = self.cache.lock().await;
        cache.cache_clear();
    }

    pub async fn len(&self) -> usize {
        let cache = self.cache.lock().await;
        cache.cache_size()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
