//! Fetch request types and error definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::cache::CacheError;

/// Per-request options.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct FetchOptions {
    /// Skip the partial fetch so only complete sources compete.
    #[serde(default)]
    pub force_refresh: bool,
}

/// A roster request as seen by the strategies.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub partition: String,
    pub filter: Option<String>,
    pub force_refresh: bool,
}

impl FetchRequest {
    pub fn new(partition: &str, filter: Option<&str>, options: FetchOptions) -> Self {
        Self {
            partition: partition.to_string(),
            filter: filter.map(str::to_string),
            force_refresh: options.force_refresh,
        }
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }
}

/// The four ways of producing a roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Fresh snapshot from the cache.
    Cache,
    /// Directory index lookup, backfilled from one page when absent.
    DirectIndex,
    /// Paginated fetch capped at a small member count.
    PartialFetch,
    /// Paginated fetch capped at a large member count.
    FullFetch,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Cache => "cache",
            StrategyKind::DirectIndex => "direct-index",
            StrategyKind::PartialFetch => "partial-fetch",
            StrategyKind::FullFetch => "full-fetch",
        }
    }

    /// Whether the strategy calls the upstream directory.
    pub fn is_live(&self) -> bool {
        !matches!(self, StrategyKind::Cache)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from the fetch layer.
///
/// Only `NoStrategySucceeded` ever reaches callers of the service; the others
/// are recorded as individual strategy outcomes.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// A strategy missed its deadline.
    #[error("strategy {strategy} timed out after {timeout_ms} ms")]
    StrategyTimeout { strategy: StrategyKind, timeout_ms: u64 },

    /// A strategy's underlying call failed.
    #[error("strategy {strategy} failed: {message}")]
    StrategyError { strategy: StrategyKind, message: String },

    /// No live result and no cached snapshot, fresh or stale.
    #[error("no strategy produced members for partition {partition}")]
    NoStrategySucceeded { partition: String },

    /// The cache store could not be read or written.
    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),
}

impl From<CacheError> for FetchError {
    fn from(err: CacheError) -> Self {
        FetchError::CacheUnavailable(err.to_string())
    }
}

impl FetchError {
    pub fn strategy_error(strategy: StrategyKind, err: impl fmt::Display) -> Self {
        FetchError::StrategyError {
            strategy,
            message: err.to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::StrategyTimeout { .. })
    }
}

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;
