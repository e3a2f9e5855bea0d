//! Resilient roster fetching.
//!
//! # Data Flow
//! ```text
//! RosterService::get_members (service.rs)
//!     → strategy.rs (StrategyTable builds the per-request plan)
//!     → executor.rs (all strategies race their own deadlines)
//!         → LiveRunner: cache | direct index | pagination.rs walks
//!     → selector.rs (largest non-empty result wins)
//!     → cache write + breaker bookkeeping, or the fallback chain
//! ```
//!
//! # Design Decisions
//! - The executor never short-circuits: a complete answer beats a fast one
//! - Strategies are values; their work sits behind a runner trait
//! - Callers see members or a single terminal error, nothing in between

pub mod executor;
pub mod pagination;
pub mod selector;
pub mod service;
pub mod strategy;
pub mod types;

pub use executor::{SettledStrategy, StrategyExecutor};
pub use pagination::{paginate, PaginationPlan};
pub use selector::{select_best, Selection};
pub use service::RosterService;
pub use strategy::{LiveRunner, Strategy, StrategyRunner, StrategyTable};
pub use types::{FetchError, FetchOptions, FetchRequest, FetchResult, StrategyKind};
