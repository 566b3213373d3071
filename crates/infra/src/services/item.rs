use tracing::{info, instrument};

use shop_catalog::{Item, ItemId, ItemKind};

use crate::error::{ServiceError, ServiceResult};
use crate::repository::ItemRepository;
use crate::store::UnitOfWork;

/// Catalog maintenance.
#[derive(Debug, Clone)]
pub struct ItemService<U> {
    uow: U,
}

impl<U> ItemService<U>
where
    U: UnitOfWork,
{
    pub fn new(uow: U) -> Self {
        Self { uow }
    }

    #[instrument(skip(self, kind), fields(dtype = kind.discriminator()), err)]
    pub fn save_item(
        &self,
        name: &str,
        price: u64,
        stock_quantity: u32,
        kind: ItemKind,
    ) -> ServiceResult<ItemId> {
        let item = Item::new(ItemId::generate(), name, price, stock_quantity, kind)?;
        self.uow
            .transaction(|tx| -> ServiceResult<()> { Ok(tx.save_item(&item)?) })?;

        info!(item_id = %item.id_typed(), "item saved");
        Ok(item.id_typed())
    }

    /// Replace name, price and stock of an existing item.
    #[instrument(skip(self), err)]
    pub fn update_item(
        &self,
        id: ItemId,
        name: &str,
        price: u64,
        stock_quantity: u32,
    ) -> ServiceResult<()> {
        self.uow.transaction(|tx| -> ServiceResult<()> {
            let mut item = tx
                .find_item(id)?
                .ok_or_else(|| ServiceError::not_found(format!("item {id}")))?;
            item.change_details(name, price, stock_quantity)?;
            tx.save_item(&item)?;
            Ok(())
        })
    }

    pub fn find_items(&self) -> ServiceResult<Vec<Item>> {
        let mut tx = self.uow.begin();
        Ok(tx.find_items()?)
    }

    pub fn find_one(&self, id: ItemId) -> ServiceResult<Item> {
        let mut tx = self.uow.begin();
        tx.find_item(id)?
            .ok_or_else(|| ServiceError::not_found(format!("item {id}")))
    }
}
