//! Metrics collection and exposition.
//!
//! Two sinks are fed from the same call sites:
//! - [`MetricsCollector`]: process-wide counters behind `RosterService::metrics`,
//!   reset only by an operator
//! - the `metrics` facade, exported to Prometheus when enabled
//!
//! # Metrics
//! - `roster_requests_total` (counter): requests by outcome
//! - `roster_request_duration_seconds` (histogram): end-to-end latency
//! - `roster_strategy_total` (counter): strategy outcomes by strategy, result
//! - `roster_breaker_state` (gauge): 0=closed, 1=open, 2=half-open per partition
//! - `roster_warm_passes_total` (counter): warm passes by partition, result

use dashmap::DashMap;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::fetch::StrategyKind;
use crate::resilience::CircuitState;

/// Read-only snapshot of the fetch counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FetchMetrics {
    pub total_requests: u64,
    pub successful_fetches: u64,
    pub timeouts: u64,
    pub cache_hits: u64,
    pub slow_queries: u64,
    pub stale_fallbacks: u64,
    pub average_latency_ms: f64,
    /// Winning strategy tally.
    pub strategy_usage: BTreeMap<String, u64>,
}

/// Monotonic counters shared by every request.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    total_requests: AtomicU64,
    successful_fetches: AtomicU64,
    timeouts: AtomicU64,
    cache_hits: AtomicU64,
    slow_queries: AtomicU64,
    stale_fallbacks: AtomicU64,
    latency_total_ms: AtomicU64,
    latency_samples: AtomicU64,
    strategy_usage: DashMap<StrategyKind, u64>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self, winner: StrategyKind) {
        self.successful_fetches.fetch_add(1, Ordering::Relaxed);
        *self.strategy_usage.entry(winner).or_insert(0) += 1;
        metrics::counter!("roster_strategy_wins_total", "strategy" => winner.as_str())
            .increment(1);
    }

    pub fn record_timeout(&self, strategy: StrategyKind) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(
            "roster_strategy_total",
            "strategy" => strategy.as_str(),
            "result" => "timeout"
        )
        .increment(1);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_fallback(&self) {
        self.stale_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Fold a finished request's latency into the running average.
    pub fn record_latency(&self, latency: Duration, slow_threshold: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_total_ms.fetch_add(ms, Ordering::Relaxed);
        self.latency_samples.fetch_add(1, Ordering::Relaxed);
        if latency > slow_threshold {
            self.slow_queries.fetch_add(1, Ordering::Relaxed);
        }
        metrics::histogram!("roster_request_duration_seconds").record(latency.as_secs_f64());
    }

    pub fn snapshot(&self) -> FetchMetrics {
        let samples = self.latency_samples.load(Ordering::Relaxed);
        let average_latency_ms = if samples == 0 {
            0.0
        } else {
            self.latency_total_ms.load(Ordering::Relaxed) as f64 / samples as f64
        };

        FetchMetrics {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_fetches: self.successful_fetches.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            slow_queries: self.slow_queries.load(Ordering::Relaxed),
            stale_fallbacks: self.stale_fallbacks.load(Ordering::Relaxed),
            average_latency_ms,
            strategy_usage: self
                .strategy_usage
                .iter()
                .map(|entry| (entry.key().to_string(), *entry.value()))
                .collect(),
        }
    }

    /// Zero every counter.
    pub fn reset(&self) {
        for counter in [
            &self.total_requests,
            &self.successful_fetches,
            &self.timeouts,
            &self.cache_hits,
            &self.slow_queries,
            &self.stale_fallbacks,
            &self.latency_total_ms,
            &self.latency_samples,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.strategy_usage.clear();
        tracing::info!("Fetch metrics reset");
    }
}

/// Count a finished request by outcome (`live`, `cache_only`, `stale_fallback`, `failed`).
pub fn record_request_outcome(outcome: &'static str) {
    metrics::counter!("roster_requests_total", "outcome" => outcome).increment(1);
}

/// Count a strategy failure other than a timeout.
pub fn record_strategy_error(strategy: StrategyKind) {
    metrics::counter!(
        "roster_strategy_total",
        "strategy" => strategy.as_str(),
        "result" => "error"
    )
    .increment(1);
}

pub fn record_breaker_state(partition: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::Open => 1.0,
        CircuitState::HalfOpen => 2.0,
    };
    metrics::gauge!("roster_breaker_state", "partition" => partition.to_string()).set(value);
}

pub fn record_warm_pass(partition: &str, result: &'static str) {
    metrics::counter!(
        "roster_warm_passes_total",
        "partition" => partition.to_string(),
        "result" => result
    )
    .increment(1);
}

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}
