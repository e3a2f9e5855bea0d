//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (fetch counters, Prometheus facade)
//!     → tracing.rs (request spans with request ids)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Fetch counters are atomics; no lock on the request path
//! - Prometheus export is optional and off by default

pub mod logging;
pub mod metrics;
pub mod tracing;

pub use self::metrics::{FetchMetrics, MetricsCollector};
