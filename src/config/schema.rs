//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the roster
//! fetch service. All types derive Serde traits for deserialization from
//! config files, and every field has a default.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the roster fetch service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RosterConfig {
    /// Upstream roster directory.
    pub directory: DirectoryConfig,

    /// Retry policy for directory requests.
    pub retries: RetryConfig,

    /// Snapshot cache settings.
    pub cache: CacheConfig,

    /// Per-partition circuit breaker settings.
    pub breaker: BreakerConfig,

    /// Strategy deadlines and pagination caps.
    pub strategies: StrategyConfig,

    /// Background cache warming.
    pub warmer: WarmerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Upstream directory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Base URL of the directory HTTP API.
    pub base_url: String,

    /// Optional bearer token sent with every request.
    pub api_token: Option<String>,

    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:7070".to_string(),
            api_token: None,
            request_timeout_ms: 4_000,
        }
    }
}

/// Retry configuration for directory calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum attempts per request, first try included.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2_000,
        }
    }
}

/// Which store backs the snapshot cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// In-process TTL map.
    #[default]
    Memory,
    /// Redis (requires the `redis` feature).
    Redis,
}

/// Snapshot cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,

    /// Redis URL, used when `backend = "redis"`.
    pub redis_url: String,

    /// Prefix for every cache key.
    pub key_prefix: String,

    /// Freshness TTL for unfiltered (full roster) entries, in seconds.
    pub full_ttl_secs: u64,

    /// Freshness TTL for role-filtered entries, in seconds.
    pub filtered_ttl_secs: u64,

    /// How long the store keeps an entry, in seconds. Must outlive both
    /// freshness TTLs so stale snapshots stay available for fallback reads.
    pub retention_secs: u64,
}

impl CacheConfig {
    /// Freshness TTL for an entry with the given filter.
    pub fn ttl_for(&self, filter: Option<&str>) -> Duration {
        match filter {
            Some(_) => Duration::from_secs(self.filtered_ttl_secs),
            None => Duration::from_secs(self.full_ttl_secs),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: "roster".to_string(),
            full_ttl_secs: 1_800,
            filtered_ttl_secs: 600,
            retention_secs: 86_400,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures that open the breaker.
    pub failure_threshold: u32,

    /// Consecutive half-open successes that close the breaker.
    pub success_threshold: u32,

    /// Time an open breaker waits before probing, in milliseconds.
    pub cooldown_ms: u64,
}

impl BreakerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            success_threshold: 3,
            cooldown_ms: 30_000,
        }
    }
}

/// Strategy deadlines and pagination limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub cache_timeout_ms: u64,
    pub direct_index_timeout_ms: u64,
    pub partial_fetch_timeout_ms: u64,
    pub full_fetch_timeout_ms: u64,

    /// Page size requested from the directory by live strategies.
    pub page_size: usize,

    /// Member cap for the partial fetch.
    pub partial_cap: usize,

    /// Member cap for the full fetch.
    pub full_cap: usize,

    /// Requests slower than this count as slow queries, in milliseconds.
    pub slow_query_threshold_ms: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            cache_timeout_ms: 1_000,
            direct_index_timeout_ms: 5_000,
            partial_fetch_timeout_ms: 5_000,
            full_fetch_timeout_ms: 8_000,
            page_size: 1_000,
            partial_cap: 1_000,
            full_cap: 10_000,
            slow_query_threshold_ms: 3_000,
        }
    }
}

/// A partition warmed from startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WarmPartition {
    pub partition: String,

    /// Role filters to publish alongside the full roster.
    #[serde(default)]
    pub filters: Vec<String>,
}

/// Cache warmer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WarmerConfig {
    /// Warm the configured partitions at startup.
    pub enabled: bool,

    /// Seconds between warm passes.
    pub interval_secs: u64,

    /// Members requested per chunk.
    pub chunk_size: usize,

    /// Hard cap on chunks per pass.
    pub max_chunks: usize,

    /// Pause between chunks in milliseconds.
    pub chunk_delay_ms: u64,

    pub partitions: Vec<WarmPartition>,
}

impl WarmerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }
}

impl Default for WarmerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 240,
            chunk_size: 100,
            max_chunks: 20,
            chunk_delay_ms: 200,
            partitions: Vec::new(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
