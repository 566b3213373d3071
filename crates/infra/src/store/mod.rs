//! Aggregate persistence boundary.
//!
//! A unit-of-work abstraction plus an in-memory implementation. Aggregates are
//! stored as versioned JSON records; commits are optimistic and atomic.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::{InMemoryStore, Transaction};
pub use r#trait::{RecordKey, StoreError, StoredRecord, Table, TransactionScope, UnitOfWork};
