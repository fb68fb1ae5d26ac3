//! Error type shared by the map and the queue.

use thiserror::Error;

/// Precondition failures reported by lookups and queue operations.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// `peek` or `dequeue` on a queue with no entries.
    #[error("priority queue is empty")]
    EmptyQueue,

    /// The key is not present (never inserted, or already removed).
    #[error("key not found")]
    NotFound,
}
