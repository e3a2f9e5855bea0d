//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Roster request:
//!     → circuit_breaker.rs (is the partition allowed live fetches?)
//!     → timeouts.rs (every strategy races its own deadline)
//!     → retries.rs + backoff.rs (each directory call retries 429/5xx)
//!     → circuit_breaker.rs (record success or failure)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every strategy has a deadline
//! - Expired strategies are cancelled, not abandoned
//! - Breaker state is per partition, not global
//! - Jittered backoff prevents thundering herd against the directory

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;

pub use circuit_breaker::{BreakerSnapshot, CircuitBreaker, CircuitState};
