//! Read-only order projections.
//!
//! Summaries are built from the persisted aggregates inside a transaction that
//! is never committed, so queries cannot change state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use shop_catalog::{Item, ItemId};
use shop_core::Address;
use shop_orders::{DeliveryStatus, MemberId, Order, OrderId, OrderStatus};

use crate::error::{ServiceError, ServiceResult};
use crate::repository::{ItemRepository, MemberRepository, OrderRepository};
use crate::store::UnitOfWork;

/// Filter for order listings. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderSearch {
    /// Substring of the member's name.
    pub member_name: Option<String>,
    pub status: Option<OrderStatus>,
}

impl OrderSearch {
    pub fn with_member_name(mut self, name: impl Into<String>) -> Self {
        self.member_name = Some(name.into());
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, member_name: &str, status: OrderStatus) -> bool {
        let name_ok = self
            .member_name
            .as_deref()
            .is_none_or(|wanted| member_name.contains(wanted));
        let status_ok = self.status.is_none_or(|wanted| wanted == status);
        name_ok && status_ok
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLineSummary {
    pub item_id: ItemId,
    pub item_name: String,
    pub order_price: u64,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub member_name: String,
    pub ordered_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub delivery_status: DeliveryStatus,
    pub address: Address,
    pub lines: Vec<OrderLineSummary>,
    pub total_price: u64,
}

/// Order listings for display.
#[derive(Debug, Clone)]
pub struct OrderQueryService<U> {
    uow: U,
}

impl<U> OrderQueryService<U>
where
    U: UnitOfWork,
{
    pub fn new(uow: U) -> Self {
        Self { uow }
    }

    pub fn find_summary(&self, order_id: OrderId) -> ServiceResult<OrderSummary> {
        let mut tx = self.uow.begin();
        let order = tx
            .find_order(order_id)?
            .ok_or_else(|| ServiceError::not_found(format!("order {order_id}")))?;
        let mut lookup = Lookup::default();
        lookup.summarize(&mut tx, &order)
    }

    /// Summaries of orders matching `search`, oldest first.
    pub fn find_summaries(&self, search: &OrderSearch) -> ServiceResult<Vec<OrderSummary>> {
        let mut tx = self.uow.begin();
        let mut lookup = Lookup::default();
        let mut summaries = Vec::new();
        for order in tx.find_orders()? {
            let summary = lookup.summarize(&mut tx, &order)?;
            if search.matches(&summary.member_name, summary.status) {
                summaries.push(summary);
            }
        }
        Ok(summaries)
    }
}

/// Per-query cache of member names and items.
#[derive(Default)]
struct Lookup {
    members: HashMap<MemberId, String>,
    items: HashMap<ItemId, Item>,
}

impl Lookup {
    fn summarize<R>(&mut self, repo: &mut R, order: &Order) -> ServiceResult<OrderSummary>
    where
        R: MemberRepository + ItemRepository,
    {
        let member_id = order.member_id();
        if !self.members.contains_key(&member_id) {
            let member = repo
                .find_member(member_id)?
                .ok_or_else(|| ServiceError::not_found(format!("member {member_id}")))?;
            self.members.insert(member_id, member.name().to_string());
        }

        let mut lines = Vec::with_capacity(order.order_items().len());
        for line in order.order_items() {
            let item_id = line.item_id();
            if !self.items.contains_key(&item_id) {
                let item = repo
                    .find_item(item_id)?
                    .ok_or_else(|| ServiceError::not_found(format!("item {item_id}")))?;
                self.items.insert(item_id, item);
            }
            lines.push(OrderLineSummary {
                item_id,
                item_name: self.items[&item_id].name().to_string(),
                order_price: line.order_price(),
                count: line.count(),
            });
        }

        Ok(OrderSummary {
            order_id: order.id_typed(),
            member_name: self.members[&member_id].clone(),
            ordered_at: order.ordered_at(),
            status: order.status(),
            delivery_status: order.delivery().status(),
            address: order.delivery().address().clone(),
            lines,
            total_price: order.total_price(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_search_matches_everything() {
        let search = OrderSearch::default();
        assert!(search.matches("anyone", OrderStatus::Order));
        assert!(search.matches("", OrderStatus::Cancel));
    }

    #[test]
    fn both_filters_must_match() {
        let search = OrderSearch::default()
            .with_member_name("kim")
            .with_status(OrderStatus::Cancel);
        assert!(search.matches("kim-minsu", OrderStatus::Cancel));
        assert!(!search.matches("kim-minsu", OrderStatus::Order));
        assert!(!search.matches("lee", OrderStatus::Cancel));
    }
}
