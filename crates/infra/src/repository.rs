//! Repository capabilities per aggregate.
//!
//! Repositories load whole aggregates eagerly (an order comes back with its
//! delivery and lines) and save them whole. There is no lazy loading: anything
//! an operation needs is loaded before the operation starts.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shop_catalog::{Item, ItemId};
use shop_core::{AggregateId, AggregateRoot};
use shop_orders::{Member, MemberId, Order, OrderId};

use crate::store::{RecordKey, StoreError, Table, Transaction};

pub trait MemberRepository {
    fn save_member(&mut self, member: &Member) -> Result<(), StoreError>;
    fn find_member(&mut self, id: MemberId) -> Result<Option<Member>, StoreError>;
    /// Member names are unique: saving a new member claims its name in the same
    /// commit, so two writers claiming one name cannot both commit.
    fn find_member_by_name(&mut self, name: &str) -> Result<Option<Member>, StoreError>;
    fn find_members(&mut self) -> Result<Vec<Member>, StoreError>;
}

pub trait ItemRepository {
    fn save_item(&mut self, item: &Item) -> Result<(), StoreError>;
    fn find_item(&mut self, id: ItemId) -> Result<Option<Item>, StoreError>;
    fn find_items(&mut self) -> Result<Vec<Item>, StoreError>;
}

pub trait OrderRepository {
    fn save_order(&mut self, order: &Order) -> Result<(), StoreError>;
    fn find_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError>;
    fn find_orders(&mut self) -> Result<Vec<Order>, StoreError>;
}

fn member_key(id: MemberId) -> RecordKey {
    RecordKey::new(Table::Members, *id.as_aggregate_id())
}

/// Name index entries are keyed by a UUID v5 of the name.
fn member_name_key(name: &str) -> RecordKey {
    let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes());
    RecordKey::new(Table::MemberNames, AggregateId::from_uuid(id))
}

#[derive(Debug, Serialize, Deserialize)]
struct MemberNameEntry {
    member_id: MemberId,
}

fn item_key(id: ItemId) -> RecordKey {
    RecordKey::new(Table::Items, *id.as_aggregate_id())
}

fn order_key(id: OrderId) -> RecordKey {
    RecordKey::new(Table::Orders, *id.as_aggregate_id())
}

impl MemberRepository for Transaction<'_> {
    fn save_member(&mut self, member: &Member) -> Result<(), StoreError> {
        let name_key = member_name_key(member.name());
        match self.load::<MemberNameEntry>(name_key)? {
            Some(entry) if entry.member_id != member.id_typed() => {
                return Err(StoreError::Concurrency(format!(
                    "{name_key}: member name {:?} already taken by {}",
                    member.name(),
                    entry.member_id
                )));
            }
            Some(_) => {}
            None => self.stage(
                name_key,
                1,
                &MemberNameEntry {
                    member_id: member.id_typed(),
                },
            )?,
        }
        self.stage(member_key(member.id_typed()), member.version(), member)
    }

    fn find_member(&mut self, id: MemberId) -> Result<Option<Member>, StoreError> {
        self.load(member_key(id))
    }

    fn find_member_by_name(&mut self, name: &str) -> Result<Option<Member>, StoreError> {
        match self.load::<MemberNameEntry>(member_name_key(name))? {
            Some(entry) => self.find_member(entry.member_id),
            None => Ok(None),
        }
    }

    fn find_members(&mut self) -> Result<Vec<Member>, StoreError> {
        self.load_all(Table::Members)
    }
}

impl ItemRepository for Transaction<'_> {
    fn save_item(&mut self, item: &Item) -> Result<(), StoreError> {
        self.stage(item_key(item.id_typed()), item.version(), item)
    }

    fn find_item(&mut self, id: ItemId) -> Result<Option<Item>, StoreError> {
        self.load(item_key(id))
    }

    fn find_items(&mut self) -> Result<Vec<Item>, StoreError> {
        self.load_all(Table::Items)
    }
}

impl OrderRepository for Transaction<'_> {
    fn save_order(&mut self, order: &Order) -> Result<(), StoreError> {
        self.stage(order_key(order.id_typed()), order.version(), order)
    }

    fn find_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let order: Option<Order> = self.load(order_key(id))?;
        if let Some(order) = &order {
            verify(order)?;
        }
        Ok(order)
    }

    fn find_orders(&mut self) -> Result<Vec<Order>, StoreError> {
        let orders: Vec<Order> = self.load_all(Table::Orders)?;
        for order in &orders {
            verify(order)?;
        }
        Ok(orders)
    }
}

fn verify(order: &Order) -> Result<(), StoreError> {
    order
        .verify_associations()
        .map_err(|e| StoreError::Corrupt(format!("{}: {e}", order_key(order.id_typed()))))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use shop_catalog::ItemKind;
    use shop_core::Address;
    use shop_orders::{Delivery, DeliveryId, OrderItem};

    use super::*;
    use crate::store::{InMemoryStore, TransactionScope, UnitOfWork};

    fn address() -> Address {
        Address::new("Seoul", "Jong-ro 1", "03000").unwrap()
    }

    fn seeded_order() -> (Member, Item, Order) {
        let mut member = Member::register(MemberId::generate(), "lee", address()).unwrap();
        let mut item = Item::new(
            ItemId::generate(),
            "Spring Book",
            20_000,
            3,
            ItemKind::Book {
                author: "Park".to_string(),
                isbn: "111".to_string(),
            },
        )
        .unwrap();
        let line = OrderItem::create(&mut item, 20_000, 1).unwrap();
        let ordered_at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let order = Order::create_at(
            OrderId::generate(),
            &mut member,
            Delivery::new(DeliveryId::generate(), address()),
            vec![line],
            ordered_at,
        )
        .unwrap();
        (member, item, order)
    }

    #[test]
    fn aggregate_graph_survives_a_round_trip() {
        let store = InMemoryStore::new();
        let (member, item, order) = seeded_order();

        let mut tx = store.begin();
        tx.save_member(&member).unwrap();
        tx.save_item(&item).unwrap();
        tx.save_order(&order).unwrap();
        tx.commit().unwrap();

        let mut tx = store.begin();
        let loaded = tx.find_order(order.id_typed()).unwrap().unwrap();
        assert_eq!(loaded, order);
        assert_eq!(loaded.delivery().order(), Some(order.id_typed()));
        let loaded_member = tx.find_member(member.id_typed()).unwrap().unwrap();
        assert_eq!(loaded_member.order_ids(), &[order.id_typed()]);
        assert_eq!(tx.find_member_by_name("lee").unwrap(), Some(member));
        assert_eq!(tx.find_member_by_name("nobody").unwrap(), None);
        assert_eq!(tx.find_items().unwrap(), vec![item]);
    }

    #[test]
    fn interleaved_claims_of_one_member_name_conflict() {
        let store = InMemoryStore::new();
        let first = Member::register(MemberId::generate(), "kim", address()).unwrap();
        let second = Member::register(MemberId::generate(), "kim", address()).unwrap();

        let mut a = store.begin();
        let mut b = store.begin();
        assert_eq!(a.find_member_by_name("kim").unwrap(), None);
        assert_eq!(b.find_member_by_name("kim").unwrap(), None);
        a.save_member(&first).unwrap();
        b.save_member(&second).unwrap();

        a.commit().unwrap();
        assert!(matches!(b.commit(), Err(StoreError::Concurrency(_))));

        let mut tx = store.begin();
        assert_eq!(tx.find_members().unwrap(), vec![first.clone()]);
        assert_eq!(tx.find_member_by_name("kim").unwrap(), Some(first));
    }

    #[test]
    fn saving_another_member_under_a_taken_name_fails() {
        let store = InMemoryStore::new();
        let first = Member::register(MemberId::generate(), "kim", address()).unwrap();
        store.transaction(|tx| tx.save_member(&first)).unwrap();

        let second = Member::register(MemberId::generate(), "kim", address()).unwrap();
        let err = store.transaction(|tx| tx.save_member(&second)).unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));

        // The owner of the name can still be saved.
        let mut tx = store.begin();
        let loaded = tx.find_member(first.id_typed()).unwrap().unwrap();
        tx.save_member(&loaded).unwrap();
        tx.commit().unwrap();
        assert_eq!(store.count(Table::Members).unwrap(), 1);
        assert_eq!(store.count(Table::MemberNames).unwrap(), 1);
    }

    #[test]
    fn status_fields_are_stored_as_names() {
        let store = InMemoryStore::new();
        let (_, _, order) = seeded_order();
        store.transaction(|tx| tx.save_order(&order)).unwrap();

        let record = store.record(order_key(order.id_typed())).unwrap().unwrap();
        assert_eq!(record.version, 1);
        assert_eq!(record.payload["status"], "ORDER");
        assert_eq!(record.payload["delivery"]["status"], "READY");
    }

    #[test]
    fn broken_back_reference_is_reported_as_corrupt() {
        let store = InMemoryStore::new();
        let (_, _, order) = seeded_order();
        let key = order_key(order.id_typed());

        let mut payload = serde_json::to_value(&order).unwrap();
        payload["delivery"]["order"] = serde_json::Value::Null;
        store.transaction(|tx| tx.stage(key, 1, &payload)).unwrap();

        let mut tx = store.begin();
        assert!(matches!(
            tx.find_order(order.id_typed()),
            Err(StoreError::Corrupt(_))
        ));
    }
}
