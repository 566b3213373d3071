//! `shop-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no storage, no logging).

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::AggregateId;
pub use value_object::{Address, ValueObject};
