//! Concurrent strategy execution.
//!
//! Every strategy runs at the same time against its own deadline. The
//! executor waits for all of them to settle; a fast partial answer never
//! cuts off a slower, more complete one.

use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use crate::fetch::strategy::{Strategy, StrategyRunner};
use crate::fetch::types::{FetchError, FetchRequest, FetchResult};
use crate::resilience::timeouts::{with_deadline, Deadline};
use crate::roster::MemberSet;

/// Outcome of one strategy.
#[derive(Debug)]
pub struct SettledStrategy {
    pub strategy: Strategy,
    pub elapsed: Duration,
    pub outcome: FetchResult<MemberSet>,
}

impl SettledStrategy {
    /// Member count if the strategy produced a usable result.
    pub fn usable_count(&self) -> Option<usize> {
        match &self.outcome {
            Ok(members) if !members.is_empty() => Some(members.len()),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct StrategyExecutor {
    runner: Arc<dyn StrategyRunner>,
}

impl StrategyExecutor {
    pub fn new(runner: Arc<dyn StrategyRunner>) -> Self {
        Self { runner }
    }

    /// Run all `strategies` for `request`; one result per strategy, in order.
    pub async fn execute(
        &self,
        strategies: &[Strategy],
        request: &FetchRequest,
    ) -> Vec<SettledStrategy> {
        let runs = strategies
            .iter()
            .map(|strategy| self.run_one(*strategy, request));
        join_all(runs).await
    }

    async fn run_one(&self, strategy: Strategy, request: &FetchRequest) -> SettledStrategy {
        let run = self.runner.run(strategy.kind, request);
        let (elapsed, outcome) = match with_deadline(strategy.timeout, run).await {
            Deadline::Completed { value, elapsed } => (elapsed, value),
            Deadline::Expired { elapsed } => (
                elapsed,
                Err(FetchError::StrategyTimeout {
                    strategy: strategy.kind,
                    timeout_ms: strategy.timeout_ms(),
                }),
            ),
        };

        match &outcome {
            Ok(members) => tracing::debug!(
                partition = %request.partition,
                strategy = %strategy.kind,
                count = members.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Strategy settled"
            ),
            Err(e) => tracing::warn!(
                partition = %request.partition,
                strategy = %strategy.kind,
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "Strategy failed"
            ),
        }

        SettledStrategy {
            strategy,
            elapsed,
            outcome,
        }
    }
}
