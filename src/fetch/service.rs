//! Roster request orchestration.
//!
//! # Fallback chain
//! ```text
//! get_members(partition, filter, options)
//!     breaker open?  ── yes ──▶ cache (fresh or stale) ──▶ members | NoStrategySucceeded
//!         │ no
//!         ▼
//!     race strategies ──▶ select largest
//!         │ winner                         │ none
//!         ▼                                ▼
//!     write cache, breaker success     breaker failure
//!         ▼                                ▼
//!     members                          cache (fresh or stale) ──▶ members | NoStrategySucceeded
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::Instrument;

use crate::cache::{CacheLayer, CacheWarmer, SharedStore, WarmReport};
use crate::config::RosterConfig;
use crate::fetch::executor::{SettledStrategy, StrategyExecutor};
use crate::fetch::selector::select_best;
use crate::fetch::strategy::{LiveRunner, StrategyTable};
use crate::fetch::types::{FetchError, FetchOptions, FetchRequest, FetchResult};
use crate::observability::metrics::{self, FetchMetrics, MetricsCollector};
use crate::observability::tracing::fetch_span;
use crate::resilience::{BreakerSnapshot, CircuitBreaker};
use crate::roster::{DirectoryResult, MemberSet, SharedDirectory};

/// The roster fetch service. One instance per process, shared behind an `Arc`.
pub struct RosterService {
    cache: CacheLayer,
    breaker: CircuitBreaker,
    executor: StrategyExecutor,
    table: StrategyTable,
    warmer: CacheWarmer,
    metrics: MetricsCollector,
    slow_query_threshold: Duration,
}

impl RosterService {
    pub fn new(config: &RosterConfig, directory: SharedDirectory, store: SharedStore) -> Self {
        let cache = CacheLayer::new(store, config.cache.clone());
        let runner = LiveRunner::new(directory.clone(), cache.clone(), config.strategies.clone());
        let warmer = CacheWarmer::new(directory, cache.clone(), &config.warmer);

        Self {
            cache,
            breaker: CircuitBreaker::new(config.breaker.clone()),
            executor: StrategyExecutor::new(Arc::new(runner)),
            table: StrategyTable::from_config(&config.strategies),
            warmer,
            metrics: MetricsCollector::new(),
            slow_query_threshold: Duration::from_millis(config.strategies.slow_query_threshold_ms),
        }
    }

    /// Members of `partition`, optionally narrowed to holders of role `filter`.
    ///
    /// Fails only when no live strategy produced members and no snapshot,
    /// fresh or stale, exists.
    pub async fn get_members(
        &self,
        partition: &str,
        filter: Option<&str>,
        options: FetchOptions,
    ) -> FetchResult<MemberSet> {
        let request = FetchRequest::new(partition, filter, options);
        let span = fetch_span(&request);

        async {
            let started = Instant::now();
            self.metrics.record_request();
            let result = self.fetch(&request).await;
            self.metrics
                .record_latency(started.elapsed(), self.slow_query_threshold);
            result
        }
        .instrument(span)
        .await
    }

    async fn fetch(&self, request: &FetchRequest) -> FetchResult<MemberSet> {
        let partition = request.partition.as_str();

        if !self.breaker.allows_live(partition) {
            tracing::debug!("Circuit open, serving from cache only");
            return self.serve_cached(request, "cache_only").await;
        }

        let strategies = self.table.plan(request);
        let settled = self.executor.execute(&strategies, request).await;
        self.record_outcomes(&settled);
        let live_answered = settled
            .iter()
            .any(|s| s.strategy.kind.is_live() && s.usable_count().is_some());

        match select_best(settled) {
            Some(selection) => {
                // Rewriting a cache win would reset its age.
                if selection.strategy.is_live() {
                    self.cache
                        .write(partition, request.filter(), &selection.members)
                        .await;
                } else {
                    self.metrics.record_cache_hit();
                }
                // Only a live answer says anything about the directory.
                if live_answered {
                    self.breaker.record_success(partition);
                }
                self.metrics.record_success(selection.strategy);
                metrics::record_request_outcome("live");

                tracing::info!(
                    strategy = %selection.strategy,
                    count = selection.members.len(),
                    "Roster fetched"
                );
                Ok(selection.members)
            }
            None => {
                self.breaker.record_failure(partition);
                tracing::warn!("Every strategy failed, falling back to cache");
                self.serve_cached(request, "stale_fallback").await
            }
        }
    }

    async fn serve_cached(
        &self,
        request: &FetchRequest,
        outcome: &'static str,
    ) -> FetchResult<MemberSet> {
        match self
            .cache
            .read_allow_stale(&request.partition, request.filter())
            .await
        {
            Some(entry) => {
                self.metrics.record_cache_hit();
                if outcome == "stale_fallback" {
                    self.metrics.record_stale_fallback();
                }
                metrics::record_request_outcome(outcome);
                tracing::info!(
                    count = entry.count,
                    captured_at = %entry.captured_at,
                    "Serving cached roster"
                );
                Ok(entry.members)
            }
            None => {
                metrics::record_request_outcome("failed");
                tracing::error!("No roster available from any strategy or cache");
                Err(FetchError::NoStrategySucceeded {
                    partition: request.partition.clone(),
                })
            }
        }
    }

    fn record_outcomes(&self, settled: &[SettledStrategy]) {
        for result in settled {
            match &result.outcome {
                Err(e) if e.is_timeout() => self.metrics.record_timeout(result.strategy.kind),
                Err(_) => metrics::record_strategy_error(result.strategy.kind),
                Ok(_) => {}
            }
        }
    }

    /// Begin warming `partition` and the given role filters.
    pub async fn start_cache_warming(&self, partition: &str, filters: Vec<String>) {
        self.warmer.start(partition, filters).await;
    }

    /// Stop warming `partition`. Returns whether a warmer was running.
    pub async fn stop_cache_warming(&self, partition: &str) -> bool {
        self.warmer.stop(partition).await
    }

    /// Run one warm pass immediately.
    pub async fn warm_now(&self, partition: &str, filters: &[String]) -> DirectoryResult<WarmReport> {
        self.warmer.warm_once(partition, filters).await
    }

    /// Partitions being warmed, with their filters.
    pub async fn warming(&self) -> Vec<(String, Vec<String>)> {
        self.warmer.active().await
    }

    pub fn metrics(&self) -> FetchMetrics {
        self.metrics.snapshot()
    }

    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    pub fn breaker_states(&self) -> Vec<BreakerSnapshot> {
        self.breaker.snapshot()
    }

    /// Stop all background work. Called once at shutdown.
    pub async fn dispose(&self) {
        self.warmer.stop_all().await;
        tracing::info!("Roster service disposed");
    }
}
