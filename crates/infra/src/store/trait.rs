use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use shop_core::AggregateId;

use crate::repository::{ItemRepository, MemberRepository, OrderRepository};

/// Logical table an aggregate record lives in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Members,
    /// Unique index from member name to member id.
    MemberNames,
    Items,
    Orders,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Members => "members",
            Table::MemberNames => "member_names",
            Table::Items => "items",
            Table::Orders => "orders",
        }
    }
}

impl core::fmt::Display for Table {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Primary key of a stored aggregate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey {
    pub table: Table,
    pub id: AggregateId,
}

impl RecordKey {
    pub fn new(table: Table, id: AggregateId) -> Self {
        Self { table, id }
    }
}

impl core::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.table, self.id)
    }
}

/// A persisted aggregate: its version at commit time and its serialized state.
///
/// Payloads are JSON; enums are written by name, so a payload stays readable
/// after variants are added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub version: u64,
    pub payload: JsonValue,
}

/// Storage-level failure.
///
/// These are infrastructure errors, as opposed to domain errors (validation,
/// invariants, transitions).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("record serialization failed: {0}")]
    Serialization(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("store lock poisoned")]
    Poisoned,
}

/// An open transaction scope over all repositories.
///
/// Reads return owned copies; writes are staged and become visible to others
/// only on [`TransactionScope::commit`]. Dropping the scope without committing
/// discards every staged write.
pub trait TransactionScope: MemberRepository + ItemRepository + OrderRepository + Sized {
    /// Apply all staged writes atomically, or none of them.
    fn commit(self) -> Result<(), StoreError>;
}

/// Unit-of-work boundary around aggregate mutations.
///
/// Every mutation of an aggregate (root, delivery, lines) and the stock
/// changes it causes happen inside one transaction. Commits are checked
/// against the versions observed when each record was read, so two writers
/// racing on the same aggregate cannot both win.
pub trait UnitOfWork: Send + Sync {
    type Tx<'a>: TransactionScope
    where
        Self: 'a;

    /// Open a transaction scope.
    fn begin(&self) -> Self::Tx<'_>;

    /// Run `f` inside a transaction; commit on `Ok`, discard on `Err`.
    fn transaction<'s, T, E, F>(&'s self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self::Tx<'s>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut tx = self.begin();
        let value = f(&mut tx)?;
        tx.commit()?;
        Ok(value)
    }
}

impl<U> UnitOfWork for std::sync::Arc<U>
where
    U: UnitOfWork + ?Sized,
{
    type Tx<'a>
        = U::Tx<'a>
    where
        Self: 'a;

    fn begin(&self) -> Self::Tx<'_> {
        (**self).begin()
    }
}
