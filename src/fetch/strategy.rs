//! Strategy table and the live strategy runner.
//!
//! Strategies are plain values built per request from a fixed table; the
//! work behind each kind lives in a [`StrategyRunner`], so deadlines and
//! selection can be exercised without a real directory.

use async_trait::async_trait;
use std::time::Duration;

use crate::cache::CacheLayer;
use crate::config::StrategyConfig;
use crate::fetch::pagination::{paginate, PaginationPlan};
use crate::fetch::types::{FetchError, FetchRequest, FetchResult, StrategyKind};
use crate::roster::{MemberSet, SharedDirectory};

/// One strategy scheduled for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    pub kind: StrategyKind,
    pub timeout: Duration,
}

impl Strategy {
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Priority-ordered strategy deadlines.
#[derive(Debug, Clone)]
pub struct StrategyTable {
    entries: [Strategy; 4],
}

impl StrategyTable {
    pub fn from_config(config: &StrategyConfig) -> Self {
        let entry = |kind, ms| Strategy {
            kind,
            timeout: Duration::from_millis(ms),
        };
        Self {
            entries: [
                entry(StrategyKind::Cache, config.cache_timeout_ms),
                entry(StrategyKind::DirectIndex, config.direct_index_timeout_ms),
                entry(StrategyKind::PartialFetch, config.partial_fetch_timeout_ms),
                entry(StrategyKind::FullFetch, config.full_fetch_timeout_ms),
            ],
        }
    }

    /// Strategies to race for `request`, in priority order.
    pub fn plan(&self, request: &FetchRequest) -> Vec<Strategy> {
        self.entries
            .iter()
            .filter(|s| !(request.force_refresh && s.kind == StrategyKind::PartialFetch))
            .copied()
            .collect()
    }

    /// Longest deadline, i.e. the worst-case latency of a request.
    pub fn longest_timeout(&self) -> Duration {
        self.entries
            .iter()
            .map(|s| s.timeout)
            .max()
            .unwrap_or_default()
    }
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self::from_config(&StrategyConfig::default())
    }
}

/// Performs the work behind a strategy kind.
#[async_trait]
pub trait StrategyRunner: Send + Sync {
    async fn run(&self, kind: StrategyKind, request: &FetchRequest) -> FetchResult<MemberSet>;
}

/// Runs strategies against the cache and the upstream directory.
pub struct LiveRunner {
    directory: SharedDirectory,
    cache: CacheLayer,
    limits: StrategyConfig,
}

impl LiveRunner {
    pub fn new(directory: SharedDirectory, cache: CacheLayer, limits: StrategyConfig) -> Self {
        Self {
            directory,
            cache,
            limits,
        }
    }

    async fn from_cache(&self, request: &FetchRequest) -> FetchResult<MemberSet> {
        let entry = self
            .cache
            .try_read(&request.partition, request.filter())
            .await?;
        match entry {
            Some(entry) => Ok(entry.members),
            None => {
                tracing::debug!(partition = %request.partition, "No fresh cached roster");
                Ok(MemberSet::new())
            }
        }
    }

    async fn from_index(&self, request: &FetchRequest) -> FetchResult<MemberSet> {
        let kind = StrategyKind::DirectIndex;
        let indexed = self
            .directory
            .fetch_by_filter_direct(&request.partition, request.filter())
            .await
            .map_err(|e| FetchError::strategy_error(kind, e))?;

        if let Some(members) = indexed.filter(|m| !m.is_empty()) {
            return Ok(members);
        }

        // Not indexed: backfill from a single page.
        let plan = PaginationPlan::capped(self.limits.page_size, self.limits.page_size);
        self.paginated(kind, request, plan).await
    }

    async fn paginated(
        &self,
        kind: StrategyKind,
        request: &FetchRequest,
        plan: PaginationPlan,
    ) -> FetchResult<MemberSet> {
        let members = paginate(self.directory.as_ref(), &request.partition, plan)
            .await
            .map_err(|e| FetchError::strategy_error(kind, e))?;
        Ok(members.filtered(request.filter()))
    }
}

#[async_trait]
impl StrategyRunner for LiveRunner {
    async fn run(&self, kind: StrategyKind, request: &FetchRequest) -> FetchResult<MemberSet> {
        match kind {
            StrategyKind::Cache => self.from_cache(request).await,
            StrategyKind::DirectIndex => self.from_index(request).await,
            StrategyKind::PartialFetch => {
                let plan = PaginationPlan::capped(self.limits.page_size, self.limits.partial_cap);
                self.paginated(kind, request, plan).await
            }
            StrategyKind::FullFetch => {
                let plan = PaginationPlan::capped(self.limits.page_size, self.limits.full_cap);
                self.paginated(kind, request, plan).await
            }
        }
    }
}
