//! Resilient roster fetching for large community partitions.
//!
//! Requests race several retrieval strategies against per-strategy deadlines,
//! keep the most complete answer, and fall back to cached snapshots when the
//! directory is failing. A per-partition circuit breaker stops hammering a
//! directory that keeps timing out, and background warmers keep hot
//! partitions cached.

pub mod admin;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod roster;

pub use config::schema::RosterConfig;
pub use fetch::{FetchError, FetchOptions, RosterService};
pub use lifecycle::Shutdown;
pub use roster::{Member, MemberSet, RosterDirectory};
