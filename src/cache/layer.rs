//! Roster snapshot cache over the external TTL store.
//!
//! Freshness is judged at read time against a filter-dependent TTL. The
//! store keeps entries for a longer retention window so that a stale
//! snapshot can still be served when every live strategy fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cache::store::{CacheError, SharedStore};
use crate::config::CacheConfig;
use crate::roster::MemberSet;

/// A point-in-time roster snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub members: MemberSet,
    pub captured_at: DateTime<Utc>,
    pub count: usize,
    pub partition: String,
    pub filter: Option<String>,
}

impl CacheEntry {
    pub fn new(partition: &str, filter: Option<&str>, members: MemberSet) -> Self {
        Self {
            count: members.len(),
            members,
            captured_at: Utc::now(),
            partition: partition.to_string(),
            filter: filter.map(str::to_string),
        }
    }

    /// Age of the snapshot at `now`. Clock skew into the future counts as zero.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.captured_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether the snapshot is still within `ttl` at `now`.
    pub fn is_fresh_at(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.age_at(now) <= ttl
    }
}

/// Read/write access to roster snapshots.
#[derive(Clone)]
pub struct CacheLayer {
    store: SharedStore,
    config: CacheConfig,
}

impl CacheLayer {
    pub fn new(store: SharedStore, config: CacheConfig) -> Self {
        Self { store, config }
    }

    /// Store key for a (partition, filter) pair.
    ///
    /// Components are percent-encoded so a `:` inside a partition or role
    /// name can never collide with the separator.
    pub fn key(&self, partition: &str, filter: Option<&str>) -> String {
        let partition = encode_component(partition);
        match filter {
            Some(role) => format!(
                "{}:{}:role:{}",
                self.config.key_prefix,
                partition,
                encode_component(role)
            ),
            None => format!("{}:{}", self.config.key_prefix, partition),
        }
    }

    pub fn ttl_for(&self, filter: Option<&str>) -> Duration {
        self.config.ttl_for(filter)
    }

    /// Fresh snapshot for the pair, if any. Store errors degrade to a miss.
    pub async fn read(&self, partition: &str, filter: Option<&str>) -> Option<CacheEntry> {
        match self.try_read(partition, filter).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(partition = %partition, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Fresh snapshot for the pair, surfacing store errors.
    pub async fn try_read(
        &self,
        partition: &str,
        filter: Option<&str>,
    ) -> Result<Option<CacheEntry>, CacheError> {
        let Some(entry) = self.load(&self.key(partition, filter)).await? else {
            return Ok(None);
        };
        let now = Utc::now();
        if entry.is_fresh_at(self.ttl_for(filter), now) {
            Ok(Some(entry))
        } else {
            tracing::debug!(
                partition = %partition,
                filter = ?filter,
                age_secs = entry.age_at(now).as_secs(),
                "Cached roster is stale"
            );
            Ok(None)
        }
    }

    /// Snapshot for the pair regardless of age. Used only by fallback paths.
    pub async fn read_allow_stale(
        &self,
        partition: &str,
        filter: Option<&str>,
    ) -> Option<CacheEntry> {
        let key = self.key(partition, filter);
        match self.load(&key).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Snapshot `members` for the pair. Returns whether the write landed.
    pub async fn write(&self, partition: &str, filter: Option<&str>, members: &MemberSet) -> bool {
        self.write_entry(&CacheEntry::new(partition, filter, members.clone()))
            .await
    }

    /// Store a prepared entry, overwriting any previous one for its key.
    pub async fn write_entry(&self, entry: &CacheEntry) -> bool {
        let key = self.key(&entry.partition, entry.filter.as_deref());
        match self.store_entry(&key, entry).await {
            Ok(()) => {
                tracing::debug!(key = %key, count = entry.count, "Cached roster snapshot");
                true
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache write failed");
                false
            }
        }
    }

    async fn load(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        match self.store.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn store_entry(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        let raw = serde_json::to_string(entry)?;
        let retention = Duration::from_secs(self.config.retention_secs);
        self.store.set_with_ttl(key, raw, retention).await
    }
}

fn encode_component(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}
