//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and cross-field
//! constraints. All problems are reported at once, not just the first.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{CacheBackend, RosterConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RosterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if url::Url::parse(&config.directory.base_url).is_err() {
        errors.push(ValidationError::new(
            "directory.base_url",
            format!("'{}' is not a valid URL", config.directory.base_url),
        ));
    }
    if config.directory.request_timeout_ms == 0 {
        errors.push(ValidationError::new("directory.request_timeout_ms", "must be > 0"));
    }

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be >= 1"));
    }
    if config.retries.base_delay_ms > config.retries.max_delay_ms {
        errors.push(ValidationError::new(
            "retries.base_delay_ms",
            "must not exceed retries.max_delay_ms",
        ));
    }

    let cache = &config.cache;
    if cache.full_ttl_secs == 0 {
        errors.push(ValidationError::new("cache.full_ttl_secs", "must be > 0"));
    }
    if cache.filtered_ttl_secs == 0 {
        errors.push(ValidationError::new("cache.filtered_ttl_secs", "must be > 0"));
    }
    if cache.retention_secs < cache.full_ttl_secs.max(cache.filtered_ttl_secs) {
        errors.push(ValidationError::new(
            "cache.retention_secs",
            "must be at least the longest freshness TTL",
        ));
    }
    if cache.key_prefix.is_empty() {
        errors.push(ValidationError::new("cache.key_prefix", "must not be empty"));
    }
    if cache.backend == CacheBackend::Redis && cache.redis_url.is_empty() {
        errors.push(ValidationError::new(
            "cache.redis_url",
            "required when cache.backend = \"redis\"",
        ));
    }

    if config.breaker.failure_threshold == 0 {
        errors.push(ValidationError::new("breaker.failure_threshold", "must be >= 1"));
    }
    if config.breaker.success_threshold == 0 {
        errors.push(ValidationError::new("breaker.success_threshold", "must be >= 1"));
    }

    let strategies = &config.strategies;
    for (field, value) in [
        ("strategies.cache_timeout_ms", strategies.cache_timeout_ms),
        ("strategies.direct_index_timeout_ms", strategies.direct_index_timeout_ms),
        ("strategies.partial_fetch_timeout_ms", strategies.partial_fetch_timeout_ms),
        ("strategies.full_fetch_timeout_ms", strategies.full_fetch_timeout_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be > 0"));
        }
    }
    if strategies.page_size == 0 {
        errors.push(ValidationError::new("strategies.page_size", "must be > 0"));
    }
    if strategies.partial_cap > strategies.full_cap {
        errors.push(ValidationError::new(
            "strategies.partial_cap",
            "must not exceed strategies.full_cap",
        ));
    }

    let warmer = &config.warmer;
    if warmer.interval_secs == 0 {
        errors.push(ValidationError::new("warmer.interval_secs", "must be > 0"));
    }
    if warmer.chunk_size == 0 {
        errors.push(ValidationError::new("warmer.chunk_size", "must be > 0"));
    }
    if warmer.max_chunks == 0 {
        errors.push(ValidationError::new("warmer.max_chunks", "must be > 0"));
    }
    let mut seen = std::collections::HashSet::new();
    for entry in &warmer.partitions {
        if entry.partition.is_empty() {
            errors.push(ValidationError::new("warmer.partitions", "partition must not be empty"));
        } else if !seen.insert(entry.partition.as_str()) {
            errors.push(ValidationError::new(
                "warmer.partitions",
                format!("partition '{}' listed more than once", entry.partition),
            ));
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if config.admin.enabled {
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::new("admin.api_key", "must not be empty"));
        }
        if config.admin.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new(
                "admin.bind_address",
                format!("'{}' is not a socket address", config.admin.bind_address),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::WarmPartition;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&RosterConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_all_errors() {
        let mut config = RosterConfig::default();
        config.breaker.failure_threshold = 0;
        config.strategies.partial_cap = 20_000;
        config.cache.retention_secs = 60;
        config.directory.base_url = "not a url".to_string();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(errors.len(), 4);
        assert!(fields.contains(&"breaker.failure_threshold"));
        assert!(fields.contains(&"strategies.partial_cap"));
        assert!(fields.contains(&"cache.retention_secs"));
        assert!(fields.contains(&"directory.base_url"));
    }

    #[test]
    fn test_duplicate_warm_partition() {
        let mut config = RosterConfig::default();
        for _ in 0..2 {
            config.warmer.partitions.push(WarmPartition {
                partition: "guild-1".into(),
                filters: vec![],
            });
        }
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("guild-1"));
    }

    #[test]
    fn test_admin_checks_skipped_when_disabled() {
        let mut config = RosterConfig::default();
        config.admin.enabled = false;
        config.admin.api_key.clear();
        assert!(validate_config(&config).is_ok());
    }
}
