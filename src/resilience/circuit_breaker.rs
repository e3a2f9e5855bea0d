//! Per-partition circuit breaker guarding live roster fetches.
//!
//! # States
//! - Closed: live strategies run normally
//! - Open: upstream assumed degraded, requests are served from cache only
//! - Half-Open: live strategies run again to probe recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= failure_threshold
//! Open → Half-Open: first access after cooldown since last failure
//! Half-Open → Closed: consecutive_successes >= success_threshold
//! Half-Open → Open: any failure while probing
//! ```
//!
//! A success while Closed only discounts one failure instead of clearing
//! the counter, so a flapping upstream still trips the breaker.
//!
//! Transitions are evaluated lazily when a partition is accessed; there is no
//! background timer. A partition gets a state entry on its first failure.

use dashmap::DashMap;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::BreakerConfig;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Breaker bookkeeping for one partition.
#[derive(Debug, Clone)]
pub struct BreakerState {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    pub last_failure_at: Option<Instant>,
    pub failure_threshold: u32,
}

impl BreakerState {
    fn new(failure_threshold: u32) -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            consecutive_successes: 0,
            last_failure_at: None,
            failure_threshold,
        }
    }
}

/// Operator-facing view of one partition's breaker.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub partition: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    /// Milliseconds since the last recorded failure.
    pub last_failure_ms_ago: Option<u64>,
}

/// Registry of breakers keyed by partition.
#[derive(Debug)]
pub struct CircuitBreaker {
    states: DashMap<String, BreakerState>,
    config: BreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        tracing::info!(
            failure_threshold = config.failure_threshold,
            success_threshold = config.success_threshold,
            cooldown_ms = config.cooldown_ms,
            "Circuit breaker initialized"
        );
        Self {
            states: DashMap::new(),
            config,
        }
    }

    /// Whether live strategies may run for `partition`.
    ///
    /// This is the access point where an Open breaker whose cooldown has
    /// elapsed moves to Half-Open.
    pub fn allows_live(&self, partition: &str) -> bool {
        let Some(mut entry) = self.states.get_mut(partition) else {
            return true;
        };
        let breaker = entry.value_mut();

        if breaker.state == CircuitState::Open {
            let cooled = breaker
                .last_failure_at
                .map(|at| at.elapsed() > self.config.cooldown())
                .unwrap_or(true);
            if !cooled {
                return false;
            }
            breaker.state = CircuitState::HalfOpen;
            breaker.consecutive_successes = 0;
            tracing::info!(partition = %partition, "Circuit half-open, probing upstream");
            metrics::record_breaker_state(partition, CircuitState::HalfOpen);
        }
        true
    }

    /// Record a successful live fetch.
    pub fn record_success(&self, partition: &str) {
        let Some(mut entry) = self.states.get_mut(partition) else {
            // Never failed: nothing to discount.
            return;
        };
        let breaker = entry.value_mut();

        match breaker.state {
            CircuitState::Closed => {
                breaker.consecutive_failures = breaker.consecutive_failures.saturating_sub(1);
            }
            CircuitState::HalfOpen => {
                breaker.consecutive_successes += 1;
                if breaker.consecutive_successes >= self.config.success_threshold {
                    breaker.state = CircuitState::Closed;
                    breaker.consecutive_failures = 0;
                    breaker.consecutive_successes = 0;
                    tracing::info!(partition = %partition, "Circuit closed, upstream recovered");
                    metrics::record_breaker_state(partition, CircuitState::Closed);
                }
            }
            CircuitState::Open => {
                tracing::debug!(partition = %partition, "Success recorded while circuit is open");
            }
        }
    }

    /// Record a failed live fetch.
    pub fn record_failure(&self, partition: &str) {
        let mut entry = self
            .states
            .entry(partition.to_string())
            .or_insert_with(|| BreakerState::new(self.config.failure_threshold));
        let breaker = entry.value_mut();
        let now = Instant::now();

        match breaker.state {
            CircuitState::Closed => {
                breaker.consecutive_failures += 1;
                breaker.last_failure_at = Some(now);
                if breaker.consecutive_failures >= breaker.failure_threshold {
                    breaker.state = CircuitState::Open;
                    tracing::warn!(
                        partition = %partition,
                        failures = breaker.consecutive_failures,
                        "Circuit opened, serving from cache only"
                    );
                    metrics::record_breaker_state(partition, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => {
                breaker.state = CircuitState::Open;
                breaker.consecutive_successes = 0;
                breaker.last_failure_at = Some(now);
                tracing::warn!(partition = %partition, "Probe failed, circuit reopened");
                metrics::record_breaker_state(partition, CircuitState::Open);
            }
            CircuitState::Open => {
                breaker.last_failure_at = Some(now);
            }
        }
    }

    /// Current state without triggering transitions.
    pub fn state(&self, partition: &str) -> CircuitState {
        self.states
            .get(partition)
            .map(|entry| entry.state)
            .unwrap_or(CircuitState::Closed)
    }

    pub fn snapshot(&self) -> Vec<BreakerSnapshot> {
        let mut snapshots: Vec<_> = self
            .states
            .iter()
            .map(|entry| BreakerSnapshot {
                partition: entry.key().clone(),
                state: entry.state,
                consecutive_failures: entry.consecutive_failures,
                consecutive_successes: entry.consecutive_successes,
                last_failure_ms_ago: entry.last_failure_at.map(|at| elapsed_ms(at.elapsed())),
            })
            .collect();
        snapshots.sort_by(|a, b| a.partition.cmp(&b.partition));
        snapshots
    }
}

fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
