use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use serde::Serialize;
use serde::de::DeserializeOwned;

use shop_core::ExpectedVersion;

use super::r#trait::{RecordKey, StoreError, StoredRecord, Table, TransactionScope, UnitOfWork};

/// In-memory record store with optimistic, all-or-nothing commits.
///
/// Intended for tests/dev and the demo binary. Records are kept ordered by key,
/// so scans return aggregates in id (creation) order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<BTreeMap<RecordKey, StoredRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed record for `key`, if any.
    pub fn record(&self, key: RecordKey) -> Result<Option<StoredRecord>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records.get(&key).cloned())
    }

    /// All committed records of `table`, in key order.
    pub fn scan(&self, table: Table) -> Result<Vec<(RecordKey, StoredRecord)>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records
            .iter()
            .filter(|(key, _)| key.table == table)
            .map(|(key, record)| (*key, record.clone()))
            .collect())
    }

    /// Number of committed records in `table`.
    pub fn count(&self, table: Table) -> Result<usize, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records.keys().filter(|key| key.table == table).count())
    }
}

impl UnitOfWork for InMemoryStore {
    type Tx<'a> = Transaction<'a>;

    fn begin(&self) -> Self::Tx<'_> {
        Transaction {
            store: self,
            observed: HashMap::new(),
            staged: BTreeMap::new(),
        }
    }
}

/// Open transaction over an [`InMemoryStore`].
///
/// Reads see this transaction's own staged writes first, then committed state.
/// Every committed record read is remembered with its version; the commit
/// rejects the whole batch if any written record moved since it was read (or
/// appeared since its absence was observed).
#[derive(Debug)]
pub struct Transaction<'a> {
    store: &'a InMemoryStore,
    observed: HashMap<RecordKey, u64>,
    staged: BTreeMap<RecordKey, StoredRecord>,
}

impl Transaction<'_> {
    /// Load and decode one record.
    pub(crate) fn load<T>(&mut self, key: RecordKey) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        if let Some(staged) = self.staged.get(&key) {
            return decode(key, staged).map(Some);
        }

        let committed = self.store.record(key)?;
        self.observed
            .entry(key)
            .or_insert_with(|| committed.as_ref().map_or(0, |r| r.version));

        committed.map(|record| decode(key, &record)).transpose()
    }

    /// Load and decode every record of `table`, staged writes included.
    pub(crate) fn load_all<T>(&mut self, table: Table) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let mut merged: BTreeMap<RecordKey, StoredRecord> = BTreeMap::new();
        for (key, record) in self.store.scan(table)? {
            self.observed.entry(key).or_insert(record.version);
            merged.insert(key, record);
        }
        for (key, record) in self.staged.iter().filter(|(key, _)| key.table == table) {
            merged.insert(*key, record.clone());
        }

        merged
            .iter()
            .map(|(key, record)| decode(*key, record))
            .collect()
    }

    /// Stage a write of `value` at `version`.
    pub(crate) fn stage<T>(&mut self, key: RecordKey, version: u64, value: &T) -> Result<(), StoreError>
    where
        T: Serialize,
    {
        let payload = serde_json::to_value(value)
            .map_err(|e| StoreError::Serialization(format!("{key}: {e}")))?;
        self.staged.insert(key, StoredRecord { version, payload });
        Ok(())
    }

    /// Number of writes waiting for commit.
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Discard every staged write. Same as dropping the transaction.
    pub fn rollback(self) {
        tracing::debug!(discarded = self.staged.len(), "transaction rolled back");
    }
}

impl TransactionScope for Transaction<'_> {
    fn commit(self) -> Result<(), StoreError> {
        if self.staged.is_empty() {
            return Ok(());
        }

        let mut records = self
            .store
            .records
            .write()
            .map_err(|_| StoreError::Poisoned)?;

        for key in self.staged.keys() {
            let current = records.get(key).map_or(0, |r| r.version);
            let expected = ExpectedVersion::Exact(self.observed.get(key).copied().unwrap_or(0));
            if let Err(e) = expected.check(current) {
                tracing::warn!(record = %key, ?expected, current, "commit rejected");
                return Err(StoreError::Concurrency(format!("{key}: {e}")));
            }
        }

        let written = self.staged.len();
        records.extend(self.staged);
        tracing::debug!(written, "transaction committed");
        Ok(())
    }
}

fn decode<T>(key: RecordKey, record: &StoredRecord) -> Result<T, StoreError>
where
    T: DeserializeOwned,
{
    serde_json::from_value(record.payload.clone())
        .map_err(|e| StoreError::Corrupt(format!("{key}: {e}")))
}
