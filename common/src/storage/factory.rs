//! Storage factory for creating storage instances from configuration.

use std::sync::Arc;

use super::config::StorageConfig;
use super::in_memory::InMemoryStorage;
use super::{Storage, StorageRead, StorageResult};

/// Creates a storage instance based on the provided configuration.
///
/// # Arguments
///
/// * `config` - The storage configuration specifying the backend type and settings.
pub async fn create_storage(config: &StorageConfig) -> StorageResult<Arc<dyn Storage>> {
    match config {
        StorageConfig::InMemory => {
            tracing::debug!("creating in-memory storage");
            Ok(Arc::new(InMemoryStorage::new()))
        }
    }
}

/// Downgrades a read-write storage handle to a read-only one.
pub fn as_read(storage: &Arc<dyn Storage>) -> Arc<dyn StorageRead> {
    Arc::clone(storage) as Arc<dyn StorageRead>
}
