//! Deadline enforcement for roster strategies.
//!
//! A strategy future that misses its deadline is dropped, which cancels the
//! directory calls it was awaiting. Nothing keeps running in the background.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// How a deadline-bound future settled.
#[derive(Debug)]
pub enum Deadline<T> {
    Completed { value: T, elapsed: Duration },
    Expired { elapsed: Duration },
}

/// Race `future` against `timeout`.
pub async fn with_deadline<F, T>(timeout: Duration, future: F) -> Deadline<T>
where
    F: Future<Output = T>,
{
    let started = Instant::now();
    match tokio::time::timeout(timeout, future).await {
        Ok(value) => Deadline::Completed {
            value,
            elapsed: started.elapsed(),
        },
        Err(_) => Deadline::Expired {
            elapsed: started.elapsed(),
        },
    }
}
