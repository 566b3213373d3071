use serde::{Deserialize, Serialize};

use shop_core::{AggregateRoot, DomainError, DomainResult};

shop_core::typed_id!(
    /// Catalog item identifier.
    ItemId
);

/// Kind-specific attributes of an item.
///
/// Persisted with a `dtype` discriminator tag (`B`, `E`, `M`); tags are names,
/// so new kinds can be added without reinterpreting stored records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "dtype")]
pub enum ItemKind {
    #[serde(rename = "B")]
    Book { author: String, isbn: String },
    #[serde(rename = "E")]
    Album { artist: String, etc: String },
    #[serde(rename = "M")]
    Movie { director: String, actor: String },
}

impl ItemKind {
    pub fn discriminator(&self) -> &'static str {
        match self {
            ItemKind::Book { .. } => "B",
            ItemKind::Album { .. } => "E",
            ItemKind::Movie { .. } => "M",
        }
    }
}

/// Aggregate root: Item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    name: String,
    /// Price in smallest currency unit.
    price: u64,
    stock_quantity: u32,
    kind: ItemKind,
    version: u64,
}

impl Item {
    pub fn new(
        id: ItemId,
        name: impl Into<String>,
        price: u64,
        stock_quantity: u32,
        kind: ItemKind,
    ) -> DomainResult<Self> {
        let name = name.into();
        validate_details(&name, price)?;
        Ok(Self {
            id,
            name,
            price,
            stock_quantity,
            kind,
            version: 1,
        })
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn stock_quantity(&self) -> u32 {
        self.stock_quantity
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    pub fn add_stock(&mut self, quantity: u32) -> DomainResult<()> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        self.stock_quantity = self
            .stock_quantity
            .checked_add(quantity)
            .ok_or_else(|| DomainError::invariant("stock quantity overflow"))?;
        self.version += 1;
        Ok(())
    }

    /// Take `quantity` units out of stock.
    pub fn remove_stock(&mut self, quantity: u32) -> DomainResult<()> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if quantity > self.stock_quantity {
            return Err(DomainError::invariant(format!(
                "not enough stock for item {} (requested {quantity}, available {})",
                self.id, self.stock_quantity
            )));
        }
        self.stock_quantity -= quantity;
        self.version += 1;
        Ok(())
    }

    /// Replace name, price and stock in one step (catalog maintenance).
    pub fn change_details(
        &mut self,
        name: impl Into<String>,
        price: u64,
        stock_quantity: u32,
    ) -> DomainResult<()> {
        let name = name.into();
        validate_details(&name, price)?;
        self.name = name;
        self.price = price;
        self.stock_quantity = stock_quantity;
        self.version += 1;
        Ok(())
    }
}

fn validate_details(name: &str, price: u64) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    if price == 0 {
        return Err(DomainError::validation("price must be positive"));
    }
    Ok(())
}

impl AggregateRoot for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
