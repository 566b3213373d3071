use serde::{Deserialize, Serialize};

use shop_core::{Address, AggregateRoot, DomainError, DomainResult};

use crate::order::OrderId;

shop_core::typed_id!(
    /// Member (customer) identifier.
    MemberId
);

/// Aggregate root: Member.
///
/// The order list is a read-only back-reference: only the order factory
/// appends to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    id: MemberId,
    name: String,
    address: Address,
    orders: Vec<OrderId>,
    version: u64,
}

impl Member {
    pub fn register(id: MemberId, name: impl Into<String>, address: Address) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("member name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            address,
            orders: Vec::new(),
            version: 1,
        })
    }

    pub fn id_typed(&self) -> MemberId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn order_ids(&self) -> &[OrderId] {
        &self.orders
    }

    pub(crate) fn attach_order(&mut self, order: OrderId) {
        self.orders.push(order);
        self.version += 1;
    }
}

impl AggregateRoot for Member {
    type Id = MemberId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address::new("Seoul", "Teheran-ro 1", "06100").unwrap()
    }

    #[test]
    fn register_starts_without_orders() {
        let member = Member::register(MemberId::generate(), "kim", address()).unwrap();
        assert_eq!(member.name(), "kim");
        assert!(member.order_ids().is_empty());
        assert_eq!(member.version(), 1);
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = Member::register(MemberId::generate(), "   ", address()).unwrap_err();
        assert_eq!(err, DomainError::validation("member name cannot be empty"));
    }
}
