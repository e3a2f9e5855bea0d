//! Upstream roster directory interface.

use async_trait::async_trait;
use std::sync::Arc;

use crate::roster::types::{DirectoryResult, MemberId, MemberSet, RosterPage};

/// A paginated, rate-limited source of community rosters.
#[async_trait]
pub trait RosterDirectory: Send + Sync {
    /// Fetch one page of the roster starting after `cursor`.
    async fn fetch_page(
        &self,
        partition: &str,
        cursor: Option<&MemberId>,
        limit: usize,
    ) -> DirectoryResult<RosterPage>;

    /// Look the members up in the directory's local index.
    ///
    /// Returns `Ok(None)` when the partition is not indexed.
    async fn fetch_by_filter_direct(
        &self,
        partition: &str,
        filter: Option<&str>,
    ) -> DirectoryResult<Option<MemberSet>>;
}

/// Shared directory handle.
pub type SharedDirectory = Arc<dyn RosterDirectory>;
