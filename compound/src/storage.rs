//! Compound-key storage wrappers.
//!
//! This module provides [`RecordStorage`] and [`RecordStorageRead`] which
//! wrap the underlying storage traits with compound key encoding, and the
//! scan iterator that decodes keys back into field tuples.

use std::sync::Arc;

use bytes::Bytes;
use common::storage::factory;
use common::{Record, RecordOp, Storage, StorageIterator, StorageRead};

use crate::config::WriteOptions;
use crate::error::Result;
use crate::model::ScannedRecord;
use crate::schema::ObjectSchema;

/// Read-only compound record storage operations.
///
/// Wraps `Arc<dyn StorageRead>` with key encoding/decoding.
#[derive(Clone)]
pub(crate) struct RecordStorageRead {
    storage: Arc<dyn StorageRead>,
}

impl RecordStorageRead {
    pub(crate) fn new(storage: Arc<dyn StorageRead>) -> Self {
        Self { storage }
    }

    /// Gets the payload stored under a full key tuple.
    pub(crate) async fn get<S: AsRef<str>>(
        &self,
        schema: &ObjectSchema,
        fields: &[S],
    ) -> Result<Option<Bytes>> {
        let storage_key = schema.encode_key(fields)?;
        let record = self.storage.get(storage_key).await?;
        Ok(record.map(|r| r.value))
    }

    /// Opens a scan over every record whose leading key fields equal `prefix`.
    pub(crate) async fn scan<S: AsRef<str>>(
        &self,
        schema: Arc<ObjectSchema>,
        prefix: &[S],
    ) -> Result<RecordScanIterator> {
        let range = schema.prefix_range(prefix)?;
        let inner = self.storage.scan_iter(range).await?;
        Ok(RecordScanIterator {
            inner: Some(inner),
            schema,
            prefix_len: prefix.len(),
        })
    }
}

/// Iterator over decoded records from storage.
///
/// The underlying cursor is dropped as soon as the scan is exhausted or
/// fails; after that `next` keeps returning `None`.
pub(crate) struct RecordScanIterator {
    inner: Option<Box<dyn StorageIterator + Send>>,
    schema: Arc<ObjectSchema>,
    prefix_len: usize,
}

impl RecordScanIterator {
    /// Returns the next record, or None if iteration is complete.
    pub(crate) async fn next(&mut self) -> Result<Option<ScannedRecord>> {
        let next = match self.inner.as_mut() {
            Some(inner) => inner.next().await,
            None => return Ok(None),
        };

        let record = match next {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.inner = None;
                return Ok(None);
            }
            Err(err) => {
                self.inner = None;
                return Err(err.into());
            }
        };

        match self.schema.decode_key(&record.key) {
            Ok(fields) => Ok(Some(ScannedRecord::new(
                fields,
                record.value,
                self.prefix_len,
            ))),
            Err(err) => {
                self.inner = None;
                Err(err)
            }
        }
    }

    /// True once the underlying cursor has been released.
    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

/// Read-write compound record storage operations.
///
/// Wraps `Arc<dyn Storage>` with key encoding/decoding.
#[derive(Clone)]
pub(crate) struct RecordStorage {
    storage: Arc<dyn Storage>,
}

impl RecordStorage {
    pub(crate) fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Creates a new storage with an in-memory backend.
    #[cfg(test)]
    pub(crate) fn in_memory() -> Self {
        use common::storage::in_memory::InMemoryStorage;
        Self::new(Arc::new(InMemoryStorage::new()))
    }

    /// Returns a read-only view of this storage.
    pub(crate) fn as_read(&self) -> RecordStorageRead {
        RecordStorageRead::new(factory::as_read(&self.storage))
    }

    /// Writes a payload under a full key tuple, replacing any previous one.
    pub(crate) async fn put<S: AsRef<str>>(
        &self,
        schema: &ObjectSchema,
        fields: &[S],
        payload: Bytes,
        options: WriteOptions,
    ) -> Result<()> {
        let storage_key = schema.encode_key(fields)?;
        let record = Record::new(storage_key, payload);
        self.storage
            .put_with_options(vec![record], options.into())
            .await?;
        Ok(())
    }

    /// Deletes the record under a full key tuple. No-op if absent.
    pub(crate) async fn delete<S: AsRef<str>>(
        &self,
        schema: &ObjectSchema,
        fields: &[S],
        options: WriteOptions,
    ) -> Result<()> {
        let storage_key = schema.encode_key(fields)?;
        self.storage
            .apply(vec![RecordOp::Delete(storage_key)])
            .await?;

        // apply has no options variant, so durability is a separate flush
        if options.await_durable {
            self.flush().await?;
        }
        Ok(())
    }

    pub(crate) async fn flush(&self) -> Result<()> {
        Ok(self.storage.flush().await?)
    }

    pub(crate) async fn close(&self) -> Result<()> {
        Ok(self.storage.close().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::error::Error;

    fn marble() -> Arc<ObjectSchema> {
        Arc::new(ObjectSchema::new("Marble", ["color", "name"]))
    }

    async fn collect(iter: &mut RecordScanIterator) -> Vec<ScannedRecord> {
        let mut records = vec![];
        while let Some(record) = iter.next().await.unwrap() {
            records.push(record);
        }
        records
    }

    #[tokio::test]
    async fn should_put_and_get_payload() {
        // given
        let storage = RecordStorage::in_memory();
        let schema = marble();

        // when
        storage
            .put(&schema, &["blue", "rose"], Bytes::from("p"), WriteOptions::default())
            .await
            .unwrap();
        let result = storage.as_read().get(&schema, &["blue", "rose"]).await.unwrap();

        // then
        assert_eq!(result, Some(Bytes::from("p")));
    }

    #[tokio::test]
    async fn should_return_none_for_missing_tuple() {
        // given
        let storage = RecordStorage::in_memory();

        // when
        let result = storage
            .as_read()
            .get(&marble(), &["blue", "rose"])
            .await
            .unwrap();

        // then
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn should_delete_tuple() {
        // given
        let storage = RecordStorage::in_memory();
        let schema = marble();
        storage
            .put(&schema, &["blue", "rose"], Bytes::new(), WriteOptions::default())
            .await
            .unwrap();

        // when
        storage
            .delete(
                &schema,
                &["blue", "rose"],
                WriteOptions {
                    await_durable: true,
                },
            )
            .await
            .unwrap();

        // then
        assert!(
            storage
                .as_read()
                .get(&schema, &["blue", "rose"])
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn should_scan_decoded_records_by_prefix() {
        // given
        let storage = RecordStorage::in_memory();
        let schema = marble();
        for (color, name) in [("blue", "tulip"), ("red", "rose"), ("blue", "rose")] {
            storage
                .put(&schema, &[color, name], Bytes::from(name), WriteOptions::default())
                .await
                .unwrap();
        }

        // when
        let mut iter = storage.as_read().scan(schema, &["blue"]).await.unwrap();
        let records = collect(&mut iter).await;

        // then
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fields, vec!["blue", "rose"]);
        assert_eq!(records[0].tail(), &["rose".to_string()]);
        assert_eq!(records[1].fields, vec!["blue", "tulip"]);
        assert!(iter.is_closed());
    }

    #[tokio::test]
    async fn should_stop_on_undecodable_key() {
        // given
        let backend = Arc::new(common::storage::in_memory::InMemoryStorage::new());
        let storage = RecordStorage::new(backend.clone());
        let schema = marble();
        let mut corrupt = codec::encode_prefix("Marble", 2, &["blue"]).unwrap().to_vec();
        corrupt.extend_from_slice(b"00");
        backend
            .put(vec![Record::empty(Bytes::from(corrupt))])
            .await
            .unwrap();

        // when
        let mut iter = storage.as_read().scan(schema, &["blue"]).await.unwrap();
        let first = iter.next().await;
        let second = iter.next().await;

        // then
        assert!(matches!(first, Err(Error::Encoding(_))));
        assert_eq!(second, Ok(None));
        assert!(iter.is_closed());
    }
}
