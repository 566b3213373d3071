use serde::{Deserialize, Serialize};

use shop_core::{Address, DomainError, DomainResult, Entity};

use crate::order::OrderId;

shop_core::typed_id!(
    /// Delivery identifier.
    DeliveryId
);

/// Delivery status lifecycle: `READY` → `COMPLETE`.
///
/// Persisted by name. Never rely on declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeliveryStatus {
    Ready,
    Complete,
}

/// Shipping sub-object of an order (one-to-one, owned by the order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    id: DeliveryId,
    order: Option<OrderId>,
    address: Address,
    status: DeliveryStatus,
}

impl Delivery {
    /// A new delivery, ready to ship and not yet attached to an order.
    pub fn new(id: DeliveryId, address: Address) -> Self {
        Self {
            id,
            order: None,
            address,
            status: DeliveryStatus::Ready,
        }
    }

    pub fn id_typed(&self) -> DeliveryId {
        self.id
    }

    /// Back-reference to the owning order.
    pub fn order(&self) -> Option<OrderId> {
        self.order
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    pub fn is_complete(&self) -> bool {
        self.status == DeliveryStatus::Complete
    }

    pub(crate) fn attach_to(&mut self, order: OrderId) {
        self.order = Some(order);
    }

    pub(crate) fn complete(&mut self) -> DomainResult<()> {
        if self.is_complete() {
            return Err(DomainError::invalid_transition(format!(
                "delivery {} is already complete",
                self.id
            )));
        }
        self.status = DeliveryStatus::Complete;
        Ok(())
    }
}

impl Entity for Delivery {
    type Id = DeliveryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
