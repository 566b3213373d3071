use std::sync::Arc;

use tracing::info;

use shop_catalog::{CategoryId, CategoryTree, ItemId, ItemKind};
use shop_core::Address;
use shop_infra::{
    InMemoryStore, ItemService, MemberService, OrderLine, OrderQueryService, OrderSearch,
    OrderService, OrderSummary,
};
use shop_orders::{MemberId, OrderId, OrderStatus};

use crate::config::AppConfig;

type Store = Arc<InMemoryStore>;

/// Services sharing one store.
pub struct Shop {
    pub members: MemberService<Store>,
    pub items: ItemService<Store>,
    pub orders: OrderService<Store>,
    pub queries: OrderQueryService<Store>,
}

impl Shop {
    pub fn new(store: Store) -> Self {
        Self {
            members: MemberService::new(store.clone()),
            items: ItemService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            queries: OrderQueryService::new(store),
        }
    }
}

/// What a demo run produced.
#[derive(Debug)]
pub struct DemoReport {
    pub member_id: MemberId,
    pub shipped: OrderId,
    pub cancelled: OrderId,
    pub books_in_catalog: Vec<ItemId>,
    pub summaries: Vec<OrderSummary>,
}

/// Seed a member, two books and an album, then place two orders: one is
/// shipped, the other cancelled.
pub fn run(config: &AppConfig, shop: &Shop) -> anyhow::Result<DemoReport> {
    let address = Address::new(config.city.clone(), "Gangga", "123-123")?;
    let member_id = shop.members.join(&config.member_name, address)?;

    let jpa = shop.items.save_item(
        "JPA1 BOOK",
        10_000,
        100,
        ItemKind::Book {
            author: "Kim Younghan".to_string(),
            isbn: "1111".to_string(),
        },
    )?;
    let spring = shop.items.save_item(
        "SPRING1 BOOK",
        20_000,
        100,
        ItemKind::Book {
            author: "Kim Younghan".to_string(),
            isbn: "2222".to_string(),
        },
    )?;
    let album = shop.items.save_item(
        "Winter Album",
        15_000,
        10,
        ItemKind::Album {
            artist: "IU".to_string(),
            etc: "limited".to_string(),
        },
    )?;

    let mut categories = CategoryTree::new();
    let media = CategoryId::generate();
    let books = CategoryId::generate();
    let music = CategoryId::generate();
    categories.add_root(media, "Media")?;
    categories.add_child(media, books, "Books")?;
    categories.add_child(media, music, "Music")?;
    categories.link_item(books, jpa)?;
    categories.link_item(books, spring)?;
    categories.link_item(music, album)?;
    info!(
        categories = categories.len(),
        media_items = categories.items_under(media)?.len(),
        "catalog seeded"
    );

    let shipped = shop.orders.order(
        member_id,
        &[OrderLine::new(jpa, 1), OrderLine::new(spring, 2)],
    )?;
    shop.orders.complete_delivery(shipped)?;

    let cancelled = shop.orders.order_one(member_id, album, 3)?;
    shop.orders.cancel_order(cancelled)?;

    let summaries = shop.queries.find_summaries(&OrderSearch::default())?;
    let still_open = shop
        .orders
        .find_orders(&OrderSearch::default().with_status(OrderStatus::Order))?;
    info!(orders = summaries.len(), open = still_open.len(), "demo finished");

    Ok(DemoReport {
        member_id,
        shipped,
        cancelled,
        books_in_catalog: categories.items_under(books)?,
        summaries,
    })
}
