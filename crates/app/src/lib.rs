//! Demo wiring for the shop: seeds an in-memory store and walks an order
//! through checkout, shipping and cancellation.

pub mod config;
pub mod demo;
