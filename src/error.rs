//! Error types for stores and the read-through decorator
//!
//! Provides unified error handling using thiserror.

use std::fmt;

use thiserror::Error;

// == Store Error Enum ==
/// Error type of the [`Cache`](crate::cache::Cache) capability.
///
/// `NotFound` is the only way a store reports an absent key; every other
/// variant is treated as a backend malfunction by the decorator.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Key is not present in the cache
    #[error("key is not present in the cache")]
    NotFound,

    /// Store is at capacity and does not evict
    #[error("Cache full: {0}")]
    CacheFull(String),

    /// Conditional write was refused (key already present)
    #[error("Item not stored: {0}")]
    NotStored(String),

    /// Encoded value exceeds the backend's item size limit
    #[error("Value too large: {0} bytes")]
    ValueTooLarge(usize),

    /// Key violates the backend's key rules
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend reply did not follow the protocol
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Backend reported an error
    #[error("Server error: {0}")]
    Server(String),

    /// Context deadline elapsed before the operation finished
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl StoreError {
    /// Returns true for the absent-key signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

// == Cacher Error Enum ==
/// Error returned by [`Cacher::get`](crate::cacher::Cacher::get).
///
/// Callers tell the three failure kinds apart by variant. Only
/// `Storage` carries a value: the producer succeeded and the result is
/// usable even though it was not cached.
#[derive(Error, Debug)]
pub enum CacherError<V, E>
where
    V: fmt::Debug,
    E: std::error::Error + 'static,
{
    /// Store read failed with something other than `NotFound`
    #[error("cannot get item from cache: {0}")]
    Retrieval(#[source] StoreError),

    /// Producer failed; its error is passed through untouched
    #[error(transparent)]
    Producer(E),

    /// Store write failed after a successful compute
    #[error("cannot set item in cache: {source}")]
    Storage {
        /// The freshly computed value
        value: V,
        #[source]
        source: StoreError,
    },
}

impl<V, E> CacherError<V, E>
where
    V: fmt::Debug,
    E: std::error::Error + 'static,
{
    pub fn is_retrieval(&self) -> bool {
        matches!(self, CacherError::Retrieval(_))
    }

    pub fn is_producer(&self) -> bool {
        matches!(self, CacherError::Producer(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, CacherError::Storage { .. })
    }

    /// The computed value, present only for storage failures.
    pub fn value(&self) -> Option<&V> {
        match self {
            CacherError::Storage { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Consumes the error, yielding the computed value if there is one.
    pub fn into_value(self) -> Option<V> {
        match self {
            CacherError::Storage { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The underlying store error for retrieval and storage failures.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            CacherError::Retrieval(source) | CacherError::Storage { source, .. } => Some(source),
            CacherError::Producer(_) => None,
        }
    }

    pub fn into_producer_error(self) -> Option<E> {
        match self {
            CacherError::Producer(err) => Some(err),
            _ => None,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
