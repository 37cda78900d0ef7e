//! Shared storage plumbing: the ordered key-value store boundary and its
//! in-memory backend.

pub mod bytes;
pub mod storage;

pub use bytes::BytesRange;
pub use storage::config::StorageConfig;
pub use storage::{
    Record, RecordOp, Storage, StorageError, StorageIterator, StorageRead, StorageResult,
    WriteOptions,
};
