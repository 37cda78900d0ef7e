//! Storage backend configuration.

use serde::{Deserialize, Serialize};

/// Selects the storage backend a store is opened on.
///
/// Deserializes from a `type`-tagged map, e.g. `type: InMemory`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StorageConfig {
    /// Process-local `BTreeMap` storage; contents are lost on drop.
    #[default]
    InMemory,
}
