//! Background cache warming.
//!
//! Each warmed partition gets one task: an immediate pass, then one per
//! interval. A pass walks the full roster in small chunks with a pause
//! between them and republishes the unfiltered snapshot plus one snapshot
//! per role filter.

use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::cache::layer::{CacheEntry, CacheLayer};
use crate::config::WarmerConfig;
use crate::fetch::pagination::{paginate, PaginationPlan};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::roster::{DirectoryResult, SharedDirectory};

/// What one warm pass published.
#[derive(Debug, Clone, Serialize)]
pub struct WarmReport {
    pub partition: String,
    pub members: usize,
    /// Entries written, unfiltered one included.
    pub entries_written: usize,
    pub elapsed_ms: u64,
}

/// Everything a warm pass needs; cloned into each warming task.
#[derive(Clone)]
struct WarmPass {
    directory: SharedDirectory,
    cache: CacheLayer,
    plan: PaginationPlan,
}

impl WarmPass {
    async fn run(&self, partition: &str, filters: &[String]) -> DirectoryResult<WarmReport> {
        let started = Instant::now();
        let members = paginate(self.directory.as_ref(), partition, self.plan).await?;
        let count = members.len();

        let mut entries_written = 0;
        if members.is_empty() {
            tracing::warn!(partition = %partition, "Warm pass found no members, keeping existing snapshots");
        } else {
            let full = CacheEntry::new(partition, None, members);
            if self.cache.write_entry(&full).await {
                entries_written += 1;
            }
            for filter in filters {
                let members = full.members.with_role(filter);
                let filtered = CacheEntry::new(partition, Some(filter.as_str()), members);
                if self.cache.write_entry(&filtered).await {
                    entries_written += 1;
                }
            }
        }

        Ok(WarmReport {
            partition: partition.to_string(),
            members: count,
            entries_written,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// Run passes until `shutdown` fires. A pass in flight is dropped on shutdown.
    async fn schedule(
        self,
        partition: String,
        filters: Vec<String>,
        interval: time::Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.recv() => break,
            }

            tokio::select! {
                result = self.run(&partition, &filters) => match result {
                    Ok(report) => {
                        tracing::info!(
                            partition = %partition,
                            members = report.members,
                            entries = report.entries_written,
                            elapsed_ms = report.elapsed_ms,
                            "Cache warm pass complete"
                        );
                        metrics::record_warm_pass(&partition, "ok");
                    }
                    Err(e) => {
                        tracing::warn!(partition = %partition, error = %e, "Cache warm pass failed");
                        metrics::record_warm_pass(&partition, "error");
                    }
                },
                _ = shutdown.recv() => break,
            }
        }

        tracing::info!(partition = %partition, "Cache warmer stopped");
    }
}

struct WarmerHandle {
    shutdown: Shutdown,
    task: JoinHandle<()>,
    filters: Vec<String>,
}

impl WarmerHandle {
    /// Signal the task and wait for it to exit.
    async fn stop(self) {
        self.shutdown.trigger();
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                tracing::error!(error = %e, "Cache warmer task panicked");
            }
        }
    }
}

/// Registry of per-partition warming tasks.
pub struct CacheWarmer {
    pass: WarmPass,
    interval: time::Duration,
    handles: Mutex<HashMap<String, WarmerHandle>>,
}

impl CacheWarmer {
    pub fn new(directory: SharedDirectory, cache: CacheLayer, config: &WarmerConfig) -> Self {
        Self {
            pass: WarmPass {
                directory,
                cache,
                plan: PaginationPlan::chunked(
                    config.chunk_size,
                    config.max_chunks,
                    config.chunk_delay(),
                ),
            },
            interval: config.interval(),
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Start warming `partition`, replacing any warmer already running for it.
    ///
    /// The previous task has fully stopped before the new one is spawned, so
    /// passes for one partition never overlap.
    pub async fn start(&self, partition: &str, filters: Vec<String>) {
        let mut handles = self.handles.lock().await;
        if let Some(previous) = handles.remove(partition) {
            tracing::info!(partition = %partition, "Replacing running cache warmer");
            previous.stop().await;
        }

        let shutdown = Shutdown::new();
        let task = tokio::spawn(self.pass.clone().schedule(
            partition.to_string(),
            filters.clone(),
            self.interval,
            shutdown.subscribe(),
        ));

        tracing::info!(
            partition = %partition,
            filters = ?filters,
            interval_secs = self.interval.as_secs(),
            "Cache warmer started"
        );
        handles.insert(
            partition.to_string(),
            WarmerHandle {
                shutdown,
                task,
                filters,
            },
        );
    }

    /// Stop warming `partition`. Returns whether a warmer was running.
    pub async fn stop(&self, partition: &str) -> bool {
        let handle = self.handles.lock().await.remove(partition);
        match handle {
            Some(handle) => {
                handle.stop().await;
                true
            }
            None => false,
        }
    }

    /// Stop every warmer.
    pub async fn stop_all(&self) {
        let handles: Vec<_> = self.handles.lock().await.drain().collect();
        for (_, handle) in handles {
            handle.stop().await;
        }
    }

    /// Run a single pass now, outside any schedule.
    pub async fn warm_once(
        &self,
        partition: &str,
        filters: &[String],
    ) -> DirectoryResult<WarmReport> {
        self.pass.run(partition, filters).await
    }

    /// Partitions currently being warmed, with their filters.
    pub async fn active(&self) -> Vec<(String, Vec<String>)> {
        let handles = self.handles.lock().await;
        let mut active: Vec<_> = handles
            .iter()
            .map(|(partition, handle)| (partition.clone(), handle.filters.clone()))
            .collect();
        active.sort();
        active
    }
}
