//! Request spans.
//!
//! Every roster request runs inside a span carrying a request id, so the
//! concurrent strategy logs of one request can be correlated.

use tracing::Span;
use uuid::Uuid;

use crate::fetch::FetchRequest;

/// Span for one roster request.
pub fn fetch_span(request: &FetchRequest) -> Span {
    tracing::info_span!(
        "roster_fetch",
        request_id = %Uuid::new_v4(),
        partition = %request.partition,
        filter = ?request.filter,
        force_refresh = request.force_refresh,
    )
}
