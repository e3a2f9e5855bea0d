//! Cursor pagination over the roster directory.

use std::time::Duration;

use crate::roster::{DirectoryResult, MemberSet, RosterDirectory};

/// Bounds for one paginated walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationPlan {
    /// Members requested per page.
    pub page_size: usize,
    /// Stop once this many members are collected.
    pub max_members: usize,
    /// Pause between pages.
    pub delay: Duration,
}

impl PaginationPlan {
    /// Walk with no inter-page delay, stopping at `max_members`.
    pub fn capped(page_size: usize, max_members: usize) -> Self {
        Self {
            page_size,
            max_members,
            delay: Duration::ZERO,
        }
    }

    /// Walk at most `max_chunks` chunks, pausing `delay` between them.
    pub fn chunked(chunk_size: usize, max_chunks: usize, delay: Duration) -> Self {
        Self {
            page_size: chunk_size,
            max_members: chunk_size.saturating_mul(max_chunks),
            delay,
        }
    }

    /// Upper bound on page requests.
    pub fn max_pages(&self) -> usize {
        if self.page_size == 0 {
            0
        } else {
            self.max_members.div_ceil(self.page_size)
        }
    }
}

/// Walk the roster of `partition` until it ends or the plan's cap is hit.
pub async fn paginate(
    directory: &dyn RosterDirectory,
    partition: &str,
    plan: PaginationPlan,
) -> DirectoryResult<MemberSet> {
    let mut members = MemberSet::new();
    let mut cursor = None;

    for page_index in 0..plan.max_pages() {
        let remaining = plan.max_members.saturating_sub(members.len());
        if remaining == 0 {
            break;
        }
        if page_index > 0 && !plan.delay.is_zero() {
            tokio::time::sleep(plan.delay).await;
        }

        let limit = plan.page_size.min(remaining);
        let page = directory.fetch_page(partition, cursor.as_ref(), limit).await?;
        let received = page.members.len();
        members.merge(page.members.into_iter().collect());

        tracing::trace!(
            partition = %partition,
            page = page_index,
            received,
            total = members.len(),
            "Fetched roster page"
        );

        // Short pages are normal; only a missing cursor ends the roster.
        match page.next_cursor {
            Some(next) if received > 0 => cursor = Some(next),
            _ => break,
        }
    }

    Ok(members)
}
