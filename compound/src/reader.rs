//! Read-only record access and the [`RecordRead`] trait.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::model::ScannedRecord;
use crate::payload;
use crate::schema::SchemaRegistry;
use crate::storage::{RecordScanIterator, RecordStorageRead};

/// Trait for read operations on a record store.
///
/// This trait defines the common read interface shared by both
/// [`RecordStore`](crate::RecordStore) and [`RecordStoreReader`].
#[async_trait]
pub trait RecordRead: Send + Sync {
    /// Gets the payload stored under a full key tuple, or None if absent.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownObjectType`](crate::Error::UnknownObjectType) or
    /// [`Error::ArityMismatch`](crate::Error::ArityMismatch) if the tuple
    /// does not fit a registered schema, plus any store failure.
    async fn get_exact<S: AsRef<str> + Sync>(
        &self,
        object_type: &str,
        fields: &[S],
    ) -> Result<Option<Bytes>>;

    /// Scans every record whose leading key fields equal `prefix`.
    ///
    /// Records come back in ascending physical key order. An empty prefix
    /// scans the whole object type; a full tuple yields at most one record.
    async fn scan_by_prefix<S: AsRef<str> + Sync>(
        &self,
        object_type: &str,
        prefix: &[S],
    ) -> Result<RecordIterator>;

    /// Gets a full key tuple and deserializes its payload as JSON.
    async fn get_json<T, S>(&self, object_type: &str, fields: &[S]) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send,
        S: AsRef<str> + Sync,
    {
        match self.get_exact(object_type, fields).await? {
            Some(payload) => Ok(Some(payload::from_json(&payload)?)),
            None => Ok(None),
        }
    }
}

/// A read-only view of a record store.
///
/// `RecordStoreReader` provides access to all read operations via the
/// [`RecordRead`] trait, but not write operations. Obtain one from
/// [`RecordStore::reader`](crate::RecordStore::reader).
#[derive(Clone)]
pub struct RecordStoreReader {
    storage: RecordStorageRead,
    schemas: Arc<SchemaRegistry>,
}

impl RecordStoreReader {
    pub(crate) fn new(storage: RecordStorageRead, schemas: Arc<SchemaRegistry>) -> Self {
        Self { storage, schemas }
    }

    /// Schemas this reader resolves object types against.
    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }
}

#[async_trait]
impl RecordRead for RecordStoreReader {
    async fn get_exact<S: AsRef<str> + Sync>(
        &self,
        object_type: &str,
        fields: &[S],
    ) -> Result<Option<Bytes>> {
        let schema = self.schemas.get(object_type)?;
        let payload = self.storage.get(schema, fields).await?;
        tracing::debug!(
            object_type,
            fields = fields.len(),
            found = payload.is_some(),
            "get_exact"
        );
        Ok(payload)
    }

    async fn scan_by_prefix<S: AsRef<str> + Sync>(
        &self,
        object_type: &str,
        prefix: &[S],
    ) -> Result<RecordIterator> {
        let schema = Arc::clone(self.schemas.get(object_type)?);
        tracing::debug!(object_type, prefix = prefix.len(), "scan_by_prefix");
        let inner = self.storage.scan(schema, prefix).await?;
        Ok(RecordIterator::new(inner))
    }
}

/// Iterator over the records of a prefix scan.
///
/// Dropping the iterator releases the underlying store cursor. After the
/// scan ends or fails, `next` returns `Ok(None)`; start a new scan to
/// resume.
pub struct RecordIterator {
    pub(crate) inner: RecordScanIterator,
}

impl RecordIterator {
    pub(crate) fn new(inner: RecordScanIterator) -> Self {
        Self { inner }
    }

    /// Returns the next record, or None if iteration is complete.
    pub async fn next(&mut self) -> Result<Option<ScannedRecord>> {
        self.inner.next().await
    }

    /// Drains the remaining records into a Vec.
    pub async fn collect(mut self) -> Result<Vec<ScannedRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.next().await? {
            records.push(record);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::config::WriteOptions;
    use crate::error::Error;
    use crate::schema::ObjectSchema;
    use crate::storage::RecordStorage;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Marble {
        color: String,
        name: String,
        size: u32,
    }

    async fn reader_with_marbles() -> RecordStoreReader {
        let schemas =
            SchemaRegistry::new([ObjectSchema::new("Marble", ["color", "name"])]).unwrap();
        let storage = RecordStorage::in_memory();
        let schema = schemas.get("Marble").unwrap();
        for (color, name) in [("blue", "rose"), ("blue", "tulip"), ("red", "rose")] {
            let marble = Marble {
                color: color.to_string(),
                name: name.to_string(),
                size: 35,
            };
            storage
                .put(
                    schema,
                    &[color, name],
                    payload::to_json(&marble).unwrap(),
                    WriteOptions::default(),
                )
                .await
                .unwrap();
        }
        RecordStoreReader::new(storage.as_read(), Arc::new(schemas))
    }

    #[tokio::test]
    async fn should_get_exact_tuple() {
        // given
        let reader = reader_with_marbles().await;

        // when
        let marble: Option<Marble> = reader.get_json("Marble", &["red", "rose"]).await.unwrap();

        // then
        assert_eq!(marble.unwrap().color, "red");
    }

    #[tokio::test]
    async fn should_reject_partial_tuple_for_exact_get() {
        // given
        let reader = reader_with_marbles().await;

        // when
        let result = reader.get_exact("Marble", &["blue"]).await;

        // then
        assert_eq!(
            result,
            Err(Error::ArityMismatch {
                object_type: "Marble".to_string(),
                expected: 2,
                actual: 1,
            })
        );
    }

    #[tokio::test]
    async fn should_reject_unknown_object_type() {
        // given
        let reader = reader_with_marbles().await;

        // when
        let result = reader.scan_by_prefix("Car", &["blue"]).await;

        // then
        assert!(matches!(result, Err(Error::UnknownObjectType(t)) if t == "Car"));
    }

    #[tokio::test]
    async fn should_collect_prefix_scan() {
        // given
        let reader = reader_with_marbles().await;

        // when
        let records = reader
            .scan_by_prefix("Marble", &["blue"])
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();

        // then
        let names: Vec<&str> = records.iter().map(|r| r.tail()[0].as_str()).collect();
        assert_eq!(names, vec!["rose", "tulip"]);
        let first: Marble = records[0].payload_json().unwrap();
        assert_eq!(first.size, 35);
    }

    #[tokio::test]
    async fn should_return_none_for_absent_json_payload() {
        // given
        let reader = reader_with_marbles().await;

        // when
        let marble: Option<Marble> = reader.get_json("Marble", &["green", "x"]).await.unwrap();

        // then
        assert!(marble.is_none());
        assert_eq!(
            reader.get_exact("Marble", &["green", "x"]).await.unwrap(),
            None::<Bytes>
        );
    }
}
