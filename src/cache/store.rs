//! External TTL key-value store interface and the in-memory implementation.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Errors raised by a cache store.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The store could not be reached or rejected the command.
    #[error("cache store unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be encoded or decoded.
    #[error("cache codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Result type for cache store operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// A string key-value store with per-key expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    async fn set_with_ttl(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()>;
}

/// Shared store handle.
pub type SharedStore = Arc<dyn CacheStore>;

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    expires_at: Instant,
}

/// Process-local TTL store.
///
/// Expired keys are dropped when read; there is no sweeper.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, StoredValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys held, expired ones included.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        let value = match self.inner.get(key) {
            Some(stored) if stored.expires_at > now => return Ok(Some(stored.value.clone())),
            Some(_) => None,
            None => return Ok(None),
        };
        self.inner.remove_if(key, |_, stored| stored.expires_at <= now);
        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        self.inner.insert(
            key.to_string(),
            StoredValue {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }
}
