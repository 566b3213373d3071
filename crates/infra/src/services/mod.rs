//! Application services: one unit of work per operation.

pub mod item;
pub mod member;
pub mod order;

pub use item::ItemService;
pub use member::MemberService;
pub use order::{OrderLine, OrderService};
