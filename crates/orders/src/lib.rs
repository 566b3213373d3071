//! Orders domain module: members, deliveries, order lines and the order
//! aggregate that ties them together.
//!
//! Associations are held as ids. The order owns its delivery and lines by
//! value; members, deliveries and lines keep a non-owning back-reference to the
//! order, and every back-reference is set by the order factory in one step.

pub mod delivery;
pub mod member;
pub mod order;
pub mod order_item;
pub mod stock;

pub use delivery::{Delivery, DeliveryId, DeliveryStatus};
pub use member::{Member, MemberId};
pub use order::{Order, OrderId, OrderStatus};
pub use order_item::{OrderItem, OrderItemId};
pub use stock::StockLedger;
