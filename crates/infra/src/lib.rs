//! Infrastructure layer: persistence, unit of work, application services and
//! read projections for the shop domain.

pub mod error;
pub mod query;
pub mod repository;
pub mod services;
pub mod store;


pub use error::{ServiceError, ServiceResult};
pub use query::{OrderLineSummary, OrderQueryService, OrderSearch, OrderSummary};
pub use repository::{ItemRepository, MemberRepository, OrderRepository};
pub use services::{ItemService, MemberService, OrderLine, OrderService};
pub use store::{InMemoryStore, StoreError, TransactionScope, UnitOfWork};
