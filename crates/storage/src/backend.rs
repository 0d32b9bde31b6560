use std::ops::RangeBounds;

use async_trait::async_trait;
use bytes::Bytes;
use snafu::Snafu;

/// Result type alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Errors surfaced by storage backends
///
/// Repositories translate these into the domain error type; storage errors
/// never reach the transport layer directly.
#[derive(Debug, Snafu)]
pub enum StorageError {
    /// Backend-internal failure
    #[snafu(display("storage internal error: {message}"))]
    Internal { message: String },

    /// A compare-and-set precondition did not hold
    #[snafu(display("compare-and-set precondition failed"))]
    CasConflict,
}

impl StorageError {
    /// Create an internal storage error
    pub fn internal(message: impl Into<String>) -> Self {
        StorageError::Internal { message: message.into() }
    }

    /// Whether this error is a compare-and-set conflict
    pub fn is_cas_conflict(&self) -> bool {
        matches!(self, StorageError::CasConflict)
    }
}

/// A key-value pair returned from range reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: Bytes,
    pub value: Bytes,
}

/// Buffered write set applied atomically on commit
///
/// Operations are applied in insertion order; a later write to the same key
/// wins. Dropping a transaction without committing discards it.
#[async_trait]
pub trait Transaction: Send {
    /// Buffer a write
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>);

    /// Buffer a deletion
    fn delete(&mut self, key: Vec<u8>);

    /// Apply all buffered operations atomically
    async fn commit(self: Box<Self>) -> StorageResult<()>;
}

/// Key-value storage contract
///
/// Keys are ordered byte strings; range reads return pairs in key order.
/// `compare_and_set` is the primitive behind read-modify-write counters
/// (login and verification attempts).
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read a single key
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>>;

    /// Write a single key
    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()>;

    /// Delete a single key (absent keys are fine)
    async fn delete(&self, key: &[u8]) -> StorageResult<()>;

    /// Read all pairs whose key falls in the range, in key order
    async fn get_range<R>(&self, range: R) -> StorageResult<Vec<KeyValue>>
    where
        R: RangeBounds<Vec<u8>> + Send;

    /// Start a write transaction
    async fn transaction(&self) -> StorageResult<Box<dyn Transaction>>;

    /// Write `new_value` only if the key currently holds `expected`
    ///
    /// `expected = None` means the key must be absent. Fails with
    /// [`StorageError::CasConflict`] when the precondition does not hold.
    async fn compare_and_set(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new_value: Vec<u8>,
    ) -> StorageResult<()>;
}
