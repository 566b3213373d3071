//! Catalog domain module: sellable items and the category tree.
//!
//! Pure domain logic (no IO, no storage). Stock bookkeeping lives on [`Item`];
//! orders only ever touch stock through an item or a stock ledger.

pub mod category;
pub mod item;

pub use category::{Category, CategoryId, CategoryTree};
pub use item::{Item, ItemId, ItemKind};
