use std::collections::HashMap;

use tracing::{info, instrument};

use shop_catalog::{Item, ItemId};
use shop_orders::{Delivery, DeliveryId, MemberId, Order, OrderId, OrderItem};

use crate::error::{ServiceError, ServiceResult};
use crate::query::OrderSearch;
use crate::repository::{ItemRepository, MemberRepository, OrderRepository};
use crate::store::UnitOfWork;

/// One requested line at checkout.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub item_id: ItemId,
    pub count: u32,
}

impl OrderLine {
    pub fn new(item_id: ItemId, count: u32) -> Self {
        Self { item_id, count }
    }
}

/// Checkout, cancellation and shipping of orders.
///
/// Each operation runs in a single unit of work: the order, its member and
/// every item whose stock it touches are committed together or not at all.
#[derive(Debug, Clone)]
pub struct OrderService<U> {
    uow: U,
}

impl<U> OrderService<U>
where
    U: UnitOfWork,
{
    pub fn new(uow: U) -> Self {
        Self { uow }
    }

    /// Place an order for `member_id`, priced at current item prices and
    /// shipped to the member's address.
    #[instrument(skip(self, lines), fields(line_count = lines.len()), err)]
    pub fn order(&self, member_id: MemberId, lines: &[OrderLine]) -> ServiceResult<OrderId> {
        let order = self.uow.transaction(|tx| -> ServiceResult<Order> {
            let mut member = tx
                .find_member(member_id)?
                .ok_or_else(|| ServiceError::not_found(format!("member {member_id}")))?;

            let mut order_items = Vec::with_capacity(lines.len());
            for line in lines {
                let mut item = tx
                    .find_item(line.item_id)?
                    .ok_or_else(|| ServiceError::not_found(format!("item {}", line.item_id)))?;
                let price = item.price();
                order_items.push(OrderItem::create(&mut item, price, line.count)?);
                tx.save_item(&item)?;
            }

            let delivery = Delivery::new(DeliveryId::generate(), member.address().clone());
            let order = Order::create(&mut member, delivery, order_items)?;

            tx.save_member(&member)?;
            tx.save_order(&order)?;
            Ok(order)
        })?;

        info!(
            order_id = %order.id_typed(),
            total_price = order.total_price(),
            "order placed"
        );
        Ok(order.id_typed())
    }

    /// Single-item checkout.
    pub fn order_one(&self, member_id: MemberId, item_id: ItemId, count: u32) -> ServiceResult<OrderId> {
        self.order(member_id, &[OrderLine::new(item_id, count)])
    }

    /// Cancel an order and put its units back in stock.
    #[instrument(skip(self), err)]
    pub fn cancel_order(&self, order_id: OrderId) -> ServiceResult<()> {
        self.uow.transaction(|tx| -> ServiceResult<()> {
            let mut order = tx
                .find_order(order_id)?
                .ok_or_else(|| ServiceError::not_found(format!("order {order_id}")))?;

            let mut stock: HashMap<ItemId, Item> = HashMap::new();
            for line in order.order_items() {
                if stock.contains_key(&line.item_id()) {
                    continue;
                }
                let item = tx
                    .find_item(line.item_id())?
                    .ok_or_else(|| ServiceError::not_found(format!("item {}", line.item_id())))?;
                stock.insert(line.item_id(), item);
            }

            order.cancel(&mut stock)?;

            for item in stock.values() {
                tx.save_item(item)?;
            }
            tx.save_order(&order)?;
            Ok(())
        })?;

        info!(%order_id, "order cancelled");
        Ok(())
    }

    /// Mark an order's delivery as shipped.
    #[instrument(skip(self), err)]
    pub fn complete_delivery(&self, order_id: OrderId) -> ServiceResult<()> {
        self.uow.transaction(|tx| -> ServiceResult<()> {
            let mut order = tx
                .find_order(order_id)?
                .ok_or_else(|| ServiceError::not_found(format!("order {order_id}")))?;
            order.complete_delivery()?;
            tx.save_order(&order)?;
            Ok(())
        })?;

        info!(%order_id, "delivery completed");
        Ok(())
    }

    pub fn find_one(&self, order_id: OrderId) -> ServiceResult<Order> {
        let mut tx = self.uow.begin();
        tx.find_order(order_id)?
            .ok_or_else(|| ServiceError::not_found(format!("order {order_id}")))
    }

    /// Orders matching `search`, oldest first.
    pub fn find_orders(&self, search: &OrderSearch) -> ServiceResult<Vec<Order>> {
        let mut tx = self.uow.begin();
        let mut member_names: HashMap<MemberId, String> = HashMap::new();
        let mut matching = Vec::new();

        for order in tx.find_orders()? {
            let member_id = order.member_id();
            if !member_names.contains_key(&member_id) {
                let member = tx
                    .find_member(member_id)?
                    .ok_or_else(|| ServiceError::not_found(format!("member {member_id}")))?;
                member_names.insert(member_id, member.name().to_string());
            }
            if search.matches(&member_names[&member_id], order.status()) {
                matching.push(order);
            }
        }

        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shop_catalog::ItemKind;
    use shop_core::Address;
    use shop_orders::{DeliveryStatus, OrderStatus};

    use super::*;
    use crate::services::{ItemService, MemberService};
    use crate::store::{InMemoryStore, Table};

    struct Shop {
        store: Arc<InMemoryStore>,
        orders: OrderService<Arc<InMemoryStore>>,
        items: ItemService<Arc<InMemoryStore>>,
        member: MemberId,
    }

    fn shop() -> Shop {
        let store = Arc::new(InMemoryStore::new());
        let members = MemberService::new(store.clone());
        let member = members
            .join("member1", Address::new("Seoul", "Gangga", "123-123").unwrap())
            .unwrap();
        Shop {
            orders: OrderService::new(store.clone()),
            items: ItemService::new(store.clone()),
            store,
            member,
        }
    }

    fn book(shop: &Shop, price: u64, stock: u32) -> ItemId {
        shop.items
            .save_item(
                "JPA",
                price,
                stock,
                ItemKind::Book {
                    author: "Kim".to_string(),
                    isbn: "978".to_string(),
                },
            )
            .unwrap()
    }

    #[test]
    fn order_places_and_takes_stock() {
        let shop = shop();
        let item = book(&shop, 10_000, 10);

        let order_id = shop.orders.order_one(shop.member, item, 2).unwrap();

        let order = shop.orders.find_one(order_id).unwrap();
        assert_eq!(order.status(), OrderStatus::Order);
        assert_eq!(order.order_items().len(), 1);
        assert_eq!(order.total_price(), 20_000);
        assert_eq!(order.delivery().status(), DeliveryStatus::Ready);
        assert_eq!(order.delivery().address().city(), "Seoul");
        assert_eq!(shop.items.find_one(item).unwrap().stock_quantity(), 8);
    }

    #[test]
    fn too_many_units_fails_and_changes_nothing() {
        let shop = shop();
        let item = book(&shop, 10_000, 10);

        let err = shop.orders.order_one(shop.member, item, 11).unwrap_err();
        assert!(matches!(err, ServiceError::InvariantViolation(_)));
        assert_eq!(shop.items.find_one(item).unwrap().stock_quantity(), 10);
        assert_eq!(shop.store.count(Table::Orders).unwrap(), 0);
    }

    #[test]
    fn overflowing_total_is_rejected_and_changes_nothing() {
        let shop = shop();
        let huge = book(&shop, u64::MAX / 2 + 1, 5);
        let err = shop.orders.order_one(shop.member, huge, 2).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let half = book(&shop, u64::MAX / 2, 5);
        let err = shop
            .orders
            .order(shop.member, &[OrderLine::new(half, 2), OrderLine::new(half, 1)])
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        assert_eq!(shop.items.find_one(huge).unwrap().stock_quantity(), 5);
        assert_eq!(shop.items.find_one(half).unwrap().stock_quantity(), 5);
        assert_eq!(shop.store.count(Table::Orders).unwrap(), 0);
    }

    #[test]
    fn later_line_failure_rolls_back_earlier_lines() {
        let shop = shop();
        let plenty = book(&shop, 1_000, 10);
        let scarce = book(&shop, 500, 1);

        let err = shop
            .orders
            .order(
                shop.member,
                &[OrderLine::new(plenty, 3), OrderLine::new(scarce, 2)],
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvariantViolation(_)));
        assert_eq!(shop.items.find_one(plenty).unwrap().stock_quantity(), 10);
    }

    #[test]
    fn cancel_restores_stock() {
        let shop = shop();
        let item = book(&shop, 10_000, 10);
        let order_id = shop.orders.order_one(shop.member, item, 2).unwrap();

        shop.orders.cancel_order(order_id).unwrap();

        let order = shop.orders.find_one(order_id).unwrap();
        assert_eq!(order.status(), OrderStatus::Cancel);
        assert_eq!(order.total_price(), 20_000);
        assert_eq!(shop.items.find_one(item).unwrap().stock_quantity(), 10);
    }

    #[test]
    fn same_item_on_two_lines_is_restored_in_full() {
        let shop = shop();
        let item = book(&shop, 100, 10);
        let order_id = shop
            .orders
            .order(shop.member, &[OrderLine::new(item, 3), OrderLine::new(item, 4)])
            .unwrap();
        assert_eq!(shop.items.find_one(item).unwrap().stock_quantity(), 3);

        shop.orders.cancel_order(order_id).unwrap();
        assert_eq!(shop.items.find_one(item).unwrap().stock_quantity(), 10);
    }

    #[test]
    fn shipped_orders_cannot_be_cancelled() {
        let shop = shop();
        let item = book(&shop, 10_000, 10);
        let order_id = shop.orders.order_one(shop.member, item, 2).unwrap();
        shop.orders.complete_delivery(order_id).unwrap();

        let err = shop.orders.cancel_order(order_id).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidStateTransition(_)));
        assert_eq!(
            shop.orders.find_one(order_id).unwrap().status(),
            OrderStatus::Order
        );
        assert_eq!(shop.items.find_one(item).unwrap().stock_quantity(), 8);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let shop = shop();
        let item = book(&shop, 10_000, 10);
        assert!(matches!(
            shop.orders.order_one(MemberId::generate(), item, 1),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            shop.orders.order_one(shop.member, ItemId::generate(), 1),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            shop.orders.cancel_order(OrderId::generate()),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn empty_checkout_is_an_invalid_argument() {
        let shop = shop();
        assert!(matches!(
            shop.orders.order(shop.member, &[]),
            Err(ServiceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn find_orders_filters_by_name_and_status() {
        let shop = shop();
        let item = book(&shop, 1_000, 10);
        let first = shop.orders.order_one(shop.member, item, 1).unwrap();
        let second = shop.orders.order_one(shop.member, item, 1).unwrap();
        shop.orders.cancel_order(first).unwrap();

        let all = shop.orders.find_orders(&OrderSearch::default()).unwrap();
        assert_eq!(all.len(), 2);

        let cancelled = shop
            .orders
            .find_orders(&OrderSearch::default().with_status(OrderStatus::Cancel))
            .unwrap();
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].id_typed(), first);

        let by_name = shop
            .orders
            .find_orders(&OrderSearch::default().with_member_name("member"))
            .unwrap();
        assert_eq!(by_name.len(), 2);
        assert!(by_name.iter().any(|o| o.id_typed() == second));

        let nobody = shop
            .orders
            .find_orders(&OrderSearch::default().with_member_name("someone else"))
            .unwrap();
        assert!(nobody.is_empty());
    }
}
