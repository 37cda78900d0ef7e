//! Core RecordStore implementation with read and write APIs.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use common::Storage;
use common::storage::factory::create_storage;
use serde::Serialize;

use crate::config::{Config, WriteOptions};
use crate::error::Result;
use crate::payload;
use crate::reader::{RecordIterator, RecordRead, RecordStoreReader};
use crate::schema::SchemaRegistry;
use crate::storage::RecordStorage;

/// The main record interface providing read and write operations.
///
/// `RecordStore` maps `(object type, key tuple)` pairs onto physical keys of
/// an ordered key-value store, so that all records sharing a leading run of
/// key fields can be read back with a single range scan.
///
/// # Read Operations
///
/// Read operations are provided via the [`RecordRead`] trait, which
/// `RecordStore` implements. This allows generic code to work with either
/// `RecordStore` or [`RecordStoreReader`].
///
/// # Thread Safety
///
/// `RecordStore` is designed to be shared across threads. All methods take
/// `&self`; concurrency control is whatever the underlying store provides.
///
/// # Example
///
/// ```ignore
/// use compound::{Config, ObjectSchema, RecordRead, RecordStore};
///
/// let config = Config {
///     schemas: vec![ObjectSchema::new("Marble", ["color", "name"])],
///     ..Default::default()
/// };
/// let store = RecordStore::open(config).await?;
///
/// store.put("Marble", &["blue", "rose"], Bytes::from("{}")).await?;
///
/// let mut iter = store.scan_by_prefix("Marble", &["blue"]).await?;
/// while let Some(record) = iter.next().await? {
///     println!("{:?}", record.tail());
/// }
/// ```
pub struct RecordStore {
    storage: RecordStorage,
    schemas: Arc<SchemaRegistry>,
}

impl RecordStore {
    /// Opens a record store with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchema`](crate::Error::InvalidSchema) if a
    /// configured schema is malformed, or a storage error if the backend
    /// cannot be initialized.
    pub async fn open(config: Config) -> Result<Self> {
        let schemas = SchemaRegistry::new(config.schemas)?;
        let storage = create_storage(&config.storage).await?;
        let object_types: Vec<&str> = schemas
            .iter()
            .map(|schema| schema.object_type.as_str())
            .collect();
        tracing::debug!(?object_types, "opened record store");
        Ok(Self::with_storage(storage, schemas))
    }

    /// Creates a record store over an existing storage implementation.
    pub fn with_storage(storage: Arc<dyn Storage>, schemas: SchemaRegistry) -> Self {
        Self {
            storage: RecordStorage::new(storage),
            schemas: Arc::new(schemas),
        }
    }

    /// Schemas this store accepts.
    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /// Returns a read-only view sharing this store's storage.
    pub fn reader(&self) -> RecordStoreReader {
        RecordStoreReader::new(self.storage.as_read(), Arc::clone(&self.schemas))
    }

    /// Writes a payload under a full key tuple, replacing any previous one.
    ///
    /// This method uses default write options. Use [`put_with_options`] for
    /// custom durability settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the object type is unknown, the tuple has the
    /// wrong number of fields, a field is too long, or the write fails.
    ///
    /// [`put_with_options`]: RecordStore::put_with_options
    pub async fn put<S: AsRef<str>>(
        &self,
        object_type: &str,
        fields: &[S],
        payload: Bytes,
    ) -> Result<()> {
        self.put_with_options(object_type, fields, payload, WriteOptions::default())
            .await
    }

    /// Writes a payload under a full key tuple with custom options.
    pub async fn put_with_options<S: AsRef<str>>(
        &self,
        object_type: &str,
        fields: &[S],
        payload: Bytes,
        options: WriteOptions,
    ) -> Result<()> {
        let schema = self.schemas.get(object_type)?;
        tracing::debug!(
            object_type,
            fields = fields.len(),
            payload_len = payload.len(),
            "put"
        );
        self.storage.put(schema, fields, payload, options).await
    }

    /// Serializes `value` as JSON and writes it under a full key tuple.
    pub async fn put_json<T, S>(&self, object_type: &str, fields: &[S], value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
        S: AsRef<str>,
    {
        let payload = payload::to_json(value)?;
        self.put(object_type, fields, payload).await
    }

    /// Deletes the record under a full key tuple. No-op if it does not exist.
    pub async fn delete<S: AsRef<str>>(&self, object_type: &str, fields: &[S]) -> Result<()> {
        self.delete_with_options(object_type, fields, WriteOptions::default())
            .await
    }

    /// Deletes the record under a full key tuple with custom options.
    pub async fn delete_with_options<S: AsRef<str>>(
        &self,
        object_type: &str,
        fields: &[S],
        options: WriteOptions,
    ) -> Result<()> {
        let schema = self.schemas.get(object_type)?;
        tracing::debug!(object_type, fields = fields.len(), "delete");
        self.storage.delete(schema, fields, options).await
    }

    /// Flushes pending writes to durable storage.
    pub async fn flush(&self) -> Result<()> {
        self.storage.flush().await
    }

    /// Closes the store, releasing resources.
    ///
    /// Open iterators and readers keep their own handles and are not
    /// affected until the backend itself shuts down.
    pub async fn close(self) -> Result<()> {
        self.storage.close().await
    }
}

#[async_trait]
impl RecordRead for RecordStore {
    async fn get_exact<S: AsRef<str> + Sync>(
        &self,
        object_type: &str,
        fields: &[S],
    ) -> Result<Option<Bytes>> {
        self.reader().get_exact(object_type, fields).await
    }

    async fn scan_by_prefix<S: AsRef<str> + Sync>(
        &self,
        object_type: &str,
        prefix: &[S],
    ) -> Result<RecordIterator> {
        self.reader().scan_by_prefix(object_type, prefix).await
    }
}
