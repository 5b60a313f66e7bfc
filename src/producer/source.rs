//! Collaborators the producer drives each cycle

use std::future::Future;

/// Source of new records
pub trait RecordGenerator: Send + Sync + 'static {
    /// Record type produced
    type Record: Send + Sync + 'static;

    /// Produce one new record
    fn generate_one(&self) -> Self::Record;
}

/// Persistent store the producer writes each generated record to
///
/// Implementations must tolerate concurrent independent calls.
pub trait RecordStore<R>: Send + Sync + 'static {
    /// Persist one record
    fn persist(&self, record: &R) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Error returned by a [`RecordStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Record failed validation
    Invalid(String),
    /// No record with this id
    NotFound(u64),
    /// Store could not accept writes
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Invalid(msg) => write!(f, "Invalid record: {}", msg),
            StoreError::NotFound(id) => write!(f, "Record {} not found", id),
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}
