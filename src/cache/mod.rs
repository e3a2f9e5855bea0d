//! Roster snapshot caching subsystem.
//!
//! # Data Flow
//! ```text
//! Request path:
//!     cache strategy / fallback chain
//!     → layer.rs (key, freshness check, (de)serialization)
//!     → store.rs (CacheStore: memory or redis_store.rs)
//!
//! Background:
//!     warmer.rs (interval per partition)
//!     → paginate the directory in small chunks
//!     → layer.rs writes full + filtered snapshots
//! ```
//!
//! # Design Decisions
//! - Expiry is lazy: freshness is computed when an entry is read
//! - Store retention outlives freshness so stale data can back a fallback
//! - Store errors never fail a request; they read as a miss

pub mod layer;
pub mod store;
pub mod warmer;

#[cfg(feature = "redis")]
pub mod redis_store;

pub use layer::{CacheEntry, CacheLayer};
pub use store::{CacheError, CacheResult, CacheStore, MemoryStore, SharedStore};
pub use warmer::{CacheWarmer, WarmReport};

#[cfg(feature = "redis")]
pub use redis_store::RedisStore;
