use std::collections::BTreeMap;
use std::ops::RangeBounds;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;

use super::{RecordOp, Storage, WriteOptions};
use crate::{BytesRange, Record, StorageError, StorageIterator, StorageRead, StorageResult};

/// In-memory implementation of the Storage trait using a BTreeMap.
///
/// This implementation stores all data in memory and is useful for testing
/// or scenarios where durability is not required. A scan copies the
/// matching records out under the read lock, so an open iterator never
/// observes writes made after it was created.
pub struct InMemoryStorage {
    data: Arc<RwLock<BTreeMap<Bytes, Bytes>>>,
}

impl InMemoryStorage {
    /// Creates a new InMemoryStorage instance with an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Returns the number of keys currently stored.
    pub fn len(&self) -> usize {
        self.data.read().map(|d| d.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageRead for InMemoryStorage {
    /// Retrieves a single record by key from the in-memory store.
    #[tracing::instrument(level = "trace", skip_all)]
    async fn get(&self, key: Bytes) -> StorageResult<Option<Record>> {
        let data = self
            .data
            .read()
            .map_err(|e| StorageError::Internal(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data
            .get(&key)
            .map(|value| Record::new(key.clone(), value.clone())))
    }

    #[tracing::instrument(level = "trace", skip_all)]
    async fn scan_iter(
        &self,
        range: BytesRange,
    ) -> StorageResult<Box<dyn StorageIterator + Send + 'static>> {
        let data = self
            .data
            .read()
            .map_err(|e| StorageError::Internal(format!("Failed to acquire read lock: {}", e)))?;

        let records: Vec<Record> = data
            .range((range.start_bound().cloned(), range.end_bound().cloned()))
            .map(|(k, v)| Record::new(k.clone(), v.clone()))
            .collect();

        Ok(Box::new(InMemoryIterator {
            records: records.into_iter(),
        }))
    }
}

struct InMemoryIterator {
    records: std::vec::IntoIter<Record>,
}

#[async_trait]
impl StorageIterator for InMemoryIterator {
    #[tracing::instrument(level = "trace", skip_all)]
    async fn next(&mut self) -> StorageResult<Option<Record>> {
        Ok(self.records.next())
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    /// Applies a batch of puts and deletes under a single write lock.
    #[tracing::instrument(level = "trace", skip_all)]
    async fn apply(&self, ops: Vec<RecordOp>) -> StorageResult<()> {
        let mut data = self
            .data
            .write()
            .map_err(|e| StorageError::Internal(format!("Failed to acquire write lock: {}", e)))?;

        for op in ops {
            match op {
                RecordOp::Put(record) => {
                    data.insert(record.key, record.value);
                }
                RecordOp::Delete(key) => {
                    data.remove(&key);
                }
            }
        }

        Ok(())
    }

    /// Writes a batch of records to the in-memory store.
    ///
    /// For in-memory storage, write options are ignored since there is no
    /// durable storage to await.
    #[tracing::instrument(level = "trace", skip_all)]
    async fn put_with_options(
        &self,
        records: Vec<Record>,
        _options: WriteOptions,
    ) -> StorageResult<()> {
        let mut data = self
            .data
            .write()
            .map_err(|e| StorageError::Internal(format!("Failed to acquire write lock: {}", e)))?;

        for record in records {
            data.insert(record.key, record.value);
        }

        Ok(())
    }

    async fn flush(&self) -> StorageResult<()> {
        // all writes are immediately visible
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Injected failure that fires either once or on every call.
#[cfg(feature = "test-utils")]
#[derive(Clone)]
enum Failure {
    /// Error is returned once, then automatically cleared.
    Once(StorageError),
    /// Error is returned on every subsequent call until explicitly cleared.
    Persistent(StorageError),
}

#[cfg(feature = "test-utils")]
type FailSlot = arc_swap::ArcSwap<Option<Failure>>;

/// Checks a [`FailSlot`] and returns an error if one is set.
///
/// For [`Failure::Once`], the slot is atomically swapped to `None` so the
/// error fires exactly once.
#[cfg(feature = "test-utils")]
fn check_failure(slot: &FailSlot) -> StorageResult<()> {
    let guard = slot.load();
    match guard.as_ref() {
        None => Ok(()),
        Some(Failure::Persistent(err)) => Err(err.clone()),
        Some(Failure::Once(_)) => {
            let prev = slot.swap(Arc::new(None));
            match prev.as_ref() {
                Some(Failure::Once(err)) => Err(err.clone()),
                _ => Ok(()),
            }
        }
    }
}

/// A storage wrapper that delegates to an inner [`Storage`] but can inject
/// failures into reads, writes, scan creation, and scan iteration.
///
/// It also counts the scan cursors that are currently alive, so tests can
/// check that every exit path of a consumer releases its cursor.
///
/// Gated behind the `test-utils` feature.
///
/// # Example
///
/// ```ignore
/// let storage = FailingStorage::wrap(Arc::new(InMemoryStorage::new()));
/// storage.fail_put(StorageError::Unavailable("leader lost".into()));
/// // every put/apply call now returns Err(...)
///
/// storage.fail_scan_next_once(StorageError::Storage("io error".into()));
/// // only the next cursor advance returns Err(...), then auto-clears
/// ```
#[cfg(feature = "test-utils")]
pub struct FailingStorage {
    inner: Arc<dyn Storage>,
    fail_get: FailSlot,
    fail_put: FailSlot,
    fail_scan: FailSlot,
    fail_scan_next: Arc<FailSlot>,
    open_cursors: Arc<std::sync::atomic::AtomicUsize>,
}

#[cfg(feature = "test-utils")]
impl FailingStorage {
    /// Wraps an existing storage, with all failure injections initially `None`.
    pub fn wrap(inner: Arc<dyn Storage>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_get: arc_swap::ArcSwap::from_pointee(None),
            fail_put: arc_swap::ArcSwap::from_pointee(None),
            fail_scan: arc_swap::ArcSwap::from_pointee(None),
            fail_scan_next: Arc::new(arc_swap::ArcSwap::from_pointee(None)),
            open_cursors: Arc::new(std::sync::atomic::AtomicUsize::new(0)),
        })
    }

    /// Makes `get` return the given error on every subsequent call.
    pub fn fail_get(&self, err: StorageError) {
        self.fail_get.store(Arc::new(Some(Failure::Persistent(err))));
    }

    /// Makes `put`, `put_with_options` and `apply` return the given error on
    /// every subsequent call.
    pub fn fail_put(&self, err: StorageError) {
        self.fail_put.store(Arc::new(Some(Failure::Persistent(err))));
    }

    /// Makes the next write call return the given error, then clears.
    pub fn fail_put_once(&self, err: StorageError) {
        self.fail_put.store(Arc::new(Some(Failure::Once(err))));
    }

    /// Makes `scan_iter` return the given error on every subsequent call.
    pub fn fail_scan(&self, err: StorageError) {
        self.fail_scan
            .store(Arc::new(Some(Failure::Persistent(err))));
    }

    /// Makes the next advance of any open cursor return the given error.
    pub fn fail_scan_next_once(&self, err: StorageError) {
        self.fail_scan_next
            .store(Arc::new(Some(Failure::Once(err))));
    }

    /// Removes every injected failure.
    pub fn clear(&self) {
        self.fail_get.store(Arc::new(None));
        self.fail_put.store(Arc::new(None));
        self.fail_scan.store(Arc::new(None));
        self.fail_scan_next.store(Arc::new(None));
    }

    /// Number of scan cursors created through this wrapper and not yet dropped.
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(feature = "test-utils")]
struct TrackedIterator {
    inner: Box<dyn StorageIterator + Send + 'static>,
    fail_next: Arc<FailSlot>,
    open_cursors: Arc<std::sync::atomic::AtomicUsize>,
}

#[cfg(feature = "test-utils")]
#[async_trait]
impl StorageIterator for TrackedIterator {
    async fn next(&mut self) -> StorageResult<Option<Record>> {
        check_failure(&self.fail_next)?;
        self.inner.next().await
    }
}

#[cfg(feature = "test-utils")]
impl Drop for TrackedIterator {
    fn drop(&mut self) {
        self.open_cursors
            .fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(feature = "test-utils")]
#[async_trait]
impl StorageRead for FailingStorage {
    async fn get(&self, key: Bytes) -> StorageResult<Option<Record>> {
        check_failure(&self.fail_get)?;
        self.inner.get(key).await
    }

    async fn scan_iter(
        &self,
        range: BytesRange,
    ) -> StorageResult<Box<dyn StorageIterator + Send + 'static>> {
        check_failure(&self.fail_scan)?;
        let inner = self.inner.scan_iter(range).await?;
        self.open_cursors
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(Box::new(TrackedIterator {
            inner,
            fail_next: Arc::clone(&self.fail_scan_next),
            open_cursors: Arc::clone(&self.open_cursors),
        }))
    }
}

#[cfg(feature = "test-utils")]
#[async_trait]
impl Storage for FailingStorage {
    async fn apply(&self, ops: Vec<RecordOp>) -> StorageResult<()> {
        check_failure(&self.fail_put)?;
        self.inner.apply(ops).await
    }

    async fn put_with_options(
        &self,
        records: Vec<Record>,
        options: WriteOptions,
    ) -> StorageResult<()> {
        check_failure(&self.fail_put)?;
        self.inner.put_with_options(records, options).await
    }

    async fn flush(&self) -> StorageResult<()> {
        self.inner.flush().await
    }

    async fn close(&self) -> StorageResult<()> {
        self.inner.close().await
    }
}
