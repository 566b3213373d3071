use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shop_core::{AggregateRoot, DomainError, DomainResult};

use crate::delivery::Delivery;
use crate::member::{Member, MemberId};
use crate::order_item::OrderItem;
use crate::stock::StockLedger;

shop_core::typed_id!(
    /// Order identifier.
    OrderId
);

/// Order status lifecycle: `ORDER` → `CANCEL`, never back.
///
/// Persisted by name. Never rely on declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Order,
    Cancel,
}

/// Aggregate root: Order.
///
/// Owns its delivery and lines. Holds the member by id; the member holds the
/// order id back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    member_id: MemberId,
    order_items: Vec<OrderItem>,
    delivery: Delivery,
    ordered_at: DateTime<Utc>,
    status: OrderStatus,
    version: u64,
}

impl Order {
    /// Place a new order for `member`, timestamped now.
    ///
    /// See [`Order::create_at`].
    pub fn create(
        member: &mut Member,
        delivery: Delivery,
        order_items: Vec<OrderItem>,
    ) -> DomainResult<Self> {
        Self::create_at(OrderId::generate(), member, delivery, order_items, Utc::now())
    }

    /// Place a new order with an explicit id and timestamp.
    ///
    /// Wires the member's order list, the delivery back-reference and every
    /// line back-reference. All arguments are checked first; on error nothing
    /// (the member included) has been touched.
    pub fn create_at(
        id: OrderId,
        member: &mut Member,
        delivery: Delivery,
        order_items: Vec<OrderItem>,
        ordered_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if order_items.is_empty() {
            return Err(DomainError::invalid_argument(
                "an order needs at least one order item",
            ));
        }
        if let Some(owner) = delivery.order() {
            return Err(DomainError::invalid_argument(format!(
                "delivery {} already belongs to order {owner}",
                delivery.id_typed()
            )));
        }
        let mut line_ids = HashSet::with_capacity(order_items.len());
        for line in &order_items {
            if let Some(owner) = line.order() {
                return Err(DomainError::invalid_argument(format!(
                    "order item {} already belongs to order {owner}",
                    line.id_typed()
                )));
            }
            if !line_ids.insert(line.id_typed()) {
                return Err(DomainError::invalid_argument(format!(
                    "order item {} passed twice",
                    line.id_typed()
                )));
            }
        }
        checked_order_total(&order_items)?;
        if member.order_ids().contains(&id) {
            return Err(DomainError::invalid_argument(format!(
                "member {} already references order {id}",
                member.id_typed()
            )));
        }

        let mut order = Self {
            id,
            member_id: member.id_typed(),
            order_items: Vec::with_capacity(order_items.len()),
            delivery,
            ordered_at,
            status: OrderStatus::Order,
            version: 1,
        };
        order.set_member(member);
        order.wire_delivery();
        for line in order_items {
            order.add_order_item(line);
        }
        Ok(order)
    }

    fn set_member(&mut self, member: &mut Member) {
        self.member_id = member.id_typed();
        member.attach_order(self.id);
    }

    fn wire_delivery(&mut self) {
        self.delivery.attach_to(self.id);
    }

    fn add_order_item(&mut self, mut line: OrderItem) {
        line.attach_to(self.id);
        self.order_items.push(line);
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn member_id(&self) -> MemberId {
        self.member_id
    }

    pub fn order_items(&self) -> &[OrderItem] {
        &self.order_items
    }

    pub fn delivery(&self) -> &Delivery {
        &self.delivery
    }

    pub fn ordered_at(&self) -> DateTime<Utc> {
        self.ordered_at
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == OrderStatus::Cancel
    }

    /// Sum of `order_price * count` over all lines, recomputed on every call.
    ///
    /// Creation rejects orders whose total does not fit in a `u64`; a loaded
    /// order that overflows saturates and fails `verify_associations`.
    pub fn total_price(&self) -> u64 {
        checked_order_total(&self.order_items).unwrap_or(u64::MAX)
    }

    /// Cancel the order and every line, restoring stock through `stock`.
    ///
    /// Fails with `InvalidStateTransition` when the delivery is complete or the
    /// order is already cancelled. If a line cannot be cancelled the order is
    /// left as it was; restorations already applied to `stock` must be
    /// discarded by the caller's unit of work.
    pub fn cancel<L>(&mut self, stock: &mut L) -> DomainResult<()>
    where
        L: StockLedger + ?Sized,
    {
        if self.delivery.is_complete() {
            return Err(DomainError::invalid_transition(
                "already-shipped orders cannot be cancelled",
            ));
        }
        if self.is_cancelled() {
            return Err(DomainError::invalid_transition(format!(
                "order {} is already cancelled",
                self.id
            )));
        }

        let mut staged = self.order_items.clone();
        for line in &mut staged {
            line.cancel(stock)?;
        }

        self.order_items = staged;
        self.status = OrderStatus::Cancel;
        self.version += 1;
        Ok(())
    }

    /// Mark the delivery as complete (shipped). Cancelled orders never ship.
    pub fn complete_delivery(&mut self) -> DomainResult<()> {
        if self.is_cancelled() {
            return Err(DomainError::invalid_transition(format!(
                "order {} is cancelled and cannot be delivered",
                self.id
            )));
        }
        self.delivery.complete()?;
        self.version += 1;
        Ok(())
    }

    /// Re-check the aggregate's internal wiring (used after loading from storage).
    pub fn verify_associations(&self) -> DomainResult<()> {
        if self.order_items.is_empty() {
            return Err(DomainError::invariant(format!("order {} has no order items", self.id)));
        }
        if self.delivery.order() != Some(self.id) {
            return Err(DomainError::invariant(format!(
                "delivery {} does not point back at order {}",
                self.delivery.id_typed(),
                self.id
            )));
        }
        checked_order_total(&self.order_items).map_err(|_| {
            DomainError::invariant(format!("order {} total is out of range", self.id))
        })?;
        for line in &self.order_items {
            if line.order() != Some(self.id) {
                return Err(DomainError::invariant(format!(
                    "order item {} does not point back at order {}",
                    line.id_typed(),
                    self.id
                )));
            }
            if line.is_cancelled() != self.is_cancelled() {
                return Err(DomainError::invariant(format!(
                    "order item {} cancellation disagrees with order status {:?}",
                    line.id_typed(),
                    self.status
                )));
            }
        }
        Ok(())
    }
}

fn checked_order_total(order_items: &[OrderItem]) -> DomainResult<u64> {
    order_items
        .iter()
        .try_fold(0u64, |total, line| {
            line.checked_total().and_then(|line_total| total.checked_add(line_total))
        })
        .ok_or_else(|| DomainError::validation("order total is out of range"))
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
