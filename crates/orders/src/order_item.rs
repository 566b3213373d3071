use serde::{Deserialize, Serialize};

use shop_catalog::{Item, ItemId};
use shop_core::{DomainError, DomainResult, Entity};

use crate::order::OrderId;
use crate::stock::StockLedger;

shop_core::typed_id!(
    /// Order line identifier.
    OrderItemId
);

/// Order line: item, order-time unit price, count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    id: OrderItemId,
    item_id: ItemId,
    order: Option<OrderId>,
    /// Unit price at order time, in smallest currency unit.
    order_price: u64,
    count: u32,
    cancelled: bool,
}

impl OrderItem {
    /// Build a line for `count` units of `item`, taking them out of its stock.
    pub fn create(item: &mut Item, order_price: u64, count: u32) -> DomainResult<Self> {
        Self::create_with_id(OrderItemId::generate(), item, order_price, count)
    }

    pub fn create_with_id(
        id: OrderItemId,
        item: &mut Item,
        order_price: u64,
        count: u32,
    ) -> DomainResult<Self> {
        if count == 0 {
            return Err(DomainError::validation("count must be positive"));
        }
        if order_price == 0 {
            return Err(DomainError::validation("order_price must be positive"));
        }
        if line_total(order_price, count).is_none() {
            return Err(DomainError::validation(format!(
                "line total {order_price} x {count} is out of range"
            )));
        }
        item.remove_stock(count)?;

        Ok(Self {
            id,
            item_id: item.id_typed(),
            order: None,
            order_price,
            count,
            cancelled: false,
        })
    }

    pub fn id_typed(&self) -> OrderItemId {
        self.id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// Back-reference to the owning order.
    pub fn order(&self) -> Option<OrderId> {
        self.order
    }

    pub fn order_price(&self) -> u64 {
        self.order_price
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// `order_price * count`. Unaffected by cancellation.
    ///
    /// Lines built by [`OrderItem::create`] never overflow; a loaded line that
    /// does saturates instead of panicking and fails `verify_associations`.
    pub fn total_price(&self) -> u64 {
        self.checked_total().unwrap_or(u64::MAX)
    }

    pub(crate) fn checked_total(&self) -> Option<u64> {
        line_total(self.order_price, self.count)
    }

    pub(crate) fn attach_to(&mut self, order: OrderId) {
        self.order = Some(order);
    }

    /// Cancel the line and hand its units back to stock.
    pub(crate) fn cancel<L>(&mut self, stock: &mut L) -> DomainResult<()>
    where
        L: StockLedger + ?Sized,
    {
        if self.cancelled {
            return Err(DomainError::invalid_transition(format!(
                "order item {} is already cancelled",
                self.id
            )));
        }
        stock.restore_stock(self.item_id, self.count)?;
        self.cancelled = true;
        Ok(())
    }
}

fn line_total(order_price: u64, count: u32) -> Option<u64> {
    order_price.checked_mul(u64::from(count))
}

impl Entity for OrderItem {
    type Id = OrderItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use shop_catalog::ItemKind;

    use super::*;

    fn album(stock: u32) -> Item {
        Item::new(
            ItemId::generate(),
            "Album",
            2_000,
            stock,
            ItemKind::Album {
                artist: "NewJeans".to_string(),
                etc: String::new(),
            },
        )
        .unwrap()
    }

    #[test]
    fn create_takes_units_out_of_stock() {
        let mut item = album(5);
        let line = OrderItem::create(&mut item, 2_000, 3).unwrap();
        assert_eq!(item.stock_quantity(), 2);
        assert_eq!(line.total_price(), 6_000);
        assert_eq!(line.item_id(), item.id_typed());
        assert!(line.order().is_none());
    }

    #[test]
    fn create_fails_without_touching_stock_when_count_is_zero() {
        let mut item = album(5);
        assert!(OrderItem::create(&mut item, 2_000, 0).is_err());
        assert_eq!(item.stock_quantity(), 5);
    }

    #[test]
    fn create_propagates_not_enough_stock() {
        let mut item = album(1);
        let err = OrderItem::create(&mut item, 2_000, 2).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn overflowing_line_total_is_rejected_before_stock_moves() {
        let mut item = album(5);
        let err = OrderItem::create(&mut item, u64::MAX / 2 + 1, 2).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(item.stock_quantity(), 5);

        let line = OrderItem::create(&mut item, u64::MAX / 2, 2).unwrap();
        assert_eq!(line.total_price(), u64::MAX - 1);
    }

    #[test]
    fn cancel_restores_stock_once() {
        let mut item = album(5);
        let mut line = OrderItem::create(&mut item, 2_000, 4).unwrap();
        let mut items = HashMap::from([(item.id_typed(), item.clone())]);

        line.cancel(&mut items).unwrap();
        assert!(line.is_cancelled());
        assert_eq!(items[&item.id_typed()].stock_quantity(), 5);

        assert!(matches!(
            line.cancel(&mut items),
            Err(DomainError::InvalidStateTransition(_))
        ));
        assert_eq!(items[&item.id_typed()].stock_quantity(), 5);
    }

    #[test]
    fn cancel_against_unknown_item_fails_and_keeps_line_active() {
        let mut item = album(5);
        let mut line = OrderItem::create(&mut item, 2_000, 1).unwrap();
        let mut empty: HashMap<ItemId, Item> = HashMap::new();
        assert!(matches!(
            line.cancel(&mut empty),
            Err(DomainError::NotFound(_))
        ));
        assert!(!line.is_cancelled());
    }
}
