//! Error types for table construction and growth.

use std::collections::TryReserveError;

/// Errors raised while creating, growing or rehashing a table.
///
/// Lookup misses are never errors; they surface as `None`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TableError {
    /// A table must have at least one bucket.
    #[error("bucket count must be at least 1 (got {0})")]
    InvalidBucketCount(usize),

    /// Bucket storage could not reserve memory for more elements.
    #[error("failed to reserve bucket storage: {0}")]
    Allocation(#[from] TryReserveError),
}
