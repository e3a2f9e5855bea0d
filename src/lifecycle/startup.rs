//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the configured cache store
//! - Build the directory client
//! - Assemble the roster service and start configured warmers
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently

use std::sync::Arc;
use thiserror::Error;

use crate::cache::{CacheError, MemoryStore, SharedStore};
use crate::config::{CacheBackend, RosterConfig};
use crate::fetch::RosterService;
use crate::roster::{DirectoryError, HttpDirectory};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cache store: {0}")]
    Cache(#[from] CacheError),

    #[error("directory client: {0}")]
    Directory(#[from] DirectoryError),

    #[error("cache backend '{0}' requires the `redis` feature")]
    BackendUnavailable(&'static str),
}

/// Open the cache store named by the config.
pub async fn open_store(config: &RosterConfig) -> Result<SharedStore, StartupError> {
    match config.cache.backend {
        CacheBackend::Memory => {
            tracing::info!("Using in-memory cache store");
            Ok(Arc::new(MemoryStore::new()))
        }
        #[cfg(feature = "redis")]
        CacheBackend::Redis => {
            let store = crate::cache::RedisStore::connect(&config.cache.redis_url).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "redis"))]
        CacheBackend::Redis => Err(StartupError::BackendUnavailable("redis")),
    }
}

/// Build the roster service from a validated config.
pub async fn build_service(config: &RosterConfig) -> Result<Arc<RosterService>, StartupError> {
    let store = open_store(config).await?;
    let directory = HttpDirectory::new(&config.directory, config.retries.clone())?;

    tracing::info!(
        base_url = %config.directory.base_url,
        breaker_threshold = config.breaker.failure_threshold,
        "Roster service initialized"
    );

    Ok(Arc::new(RosterService::new(
        config,
        Arc::new(directory),
        store,
    )))
}

/// Start a warmer for every partition listed in `[warmer]`.
pub async fn start_configured_warmers(service: &RosterService, config: &RosterConfig) {
    if !config.warmer.enabled {
        tracing::info!("Cache warming disabled");
        return;
    }

    for warm in &config.warmer.partitions {
        service
            .start_cache_warming(&warm.partition, warm.filters.clone())
            .await;
    }
}
