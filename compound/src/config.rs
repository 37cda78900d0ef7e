//! Configuration options for compound record stores.

use common::StorageConfig;
use serde::{Deserialize, Serialize};

use crate::schema::ObjectSchema;

/// Configuration for opening a [`RecordStore`](crate::RecordStore).
///
/// # Example
///
/// ```ignore
/// let config: Config = serde_yaml::from_str(
///     "storage:\n  type: InMemory\nschemas:\n  - object_type: Marble\n    key_fields: [color, name]\n",
/// )?;
/// let store = RecordStore::open(config).await?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Storage backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Key layout of every object type the store accepts.
    #[serde(default)]
    pub schemas: Vec<ObjectSchema>,
}

/// Options for write operations.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// If true, waits for the write to be durable before returning.
    /// Default: false (returns once the store has applied the write).
    pub await_durable: bool,
}

impl From<WriteOptions> for common::WriteOptions {
    fn from(options: WriteOptions) -> Self {
        common::WriteOptions {
            await_durable: options.await_durable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_load_config_from_yaml() {
        // given
        let yaml = r#"
storage:
  type: InMemory
schemas:
  - object_type: Marble
    key_fields: [color, name]
"#;

        // when
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // then
        assert_eq!(config.storage, StorageConfig::InMemory);
        assert_eq!(
            config.schemas,
            vec![ObjectSchema::new("Marble", ["color", "name"])]
        );
    }

    #[test]
    fn should_default_missing_sections() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }
}
