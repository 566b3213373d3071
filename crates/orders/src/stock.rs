//! Stock restoration seam used when order lines are cancelled.

use std::collections::HashMap;

use shop_catalog::{Item, ItemId};
use shop_core::{DomainError, DomainResult};

/// Something that holds item stock and can take units back.
///
/// Implementations must apply the restoration inside the same unit of work as
/// the cancellation that triggers it.
pub trait StockLedger {
    fn restore_stock(&mut self, item_id: ItemId, quantity: u32) -> DomainResult<()>;
}

impl<L> StockLedger for &mut L
where
    L: StockLedger + ?Sized,
{
    fn restore_stock(&mut self, item_id: ItemId, quantity: u32) -> DomainResult<()> {
        (**self).restore_stock(item_id, quantity)
    }
}

/// Items already loaded in memory, keyed by id.
impl StockLedger for HashMap<ItemId, Item> {
    fn restore_stock(&mut self, item_id: ItemId, quantity: u32) -> DomainResult<()> {
        self.get_mut(&item_id)
            .ok_or_else(|| DomainError::not_found(format!("item {item_id}")))?
            .add_stock(quantity)
    }
}
