//! Value object trait: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity** - they are defined entirely
//! by their attribute values. Two value objects with the same values are considered equal.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one. An [`Address`] embedded in a member and copied into a
/// delivery is the canonical example here: the delivery keeps the address that
/// was current at checkout even if the member later moves.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Postal address embedded in members and deliveries.
///
/// Deserialization goes through [`Address::new`], so a stored address obeys
/// the same rules as a freshly built one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "AddressFields")]
pub struct Address {
    city: String,
    street: String,
    zipcode: String,
}

impl Address {
    pub fn new(
        city: impl Into<String>,
        street: impl Into<String>,
        zipcode: impl Into<String>,
    ) -> DomainResult<Self> {
        let address = Self {
            city: city.into(),
            street: street.into(),
            zipcode: zipcode.into(),
        };
        if address.city.trim().is_empty() {
            return Err(DomainError::validation("city cannot be empty"));
        }
        Ok(address)
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn zipcode(&self) -> &str {
        &self.zipcode
    }
}

#[derive(Deserialize)]
struct AddressFields {
    city: String,
    street: String,
    zipcode: String,
}

impl TryFrom<AddressFields> for Address {
    type Error = DomainError;

    fn try_from(fields: AddressFields) -> DomainResult<Self> {
        Address::new(fields.city, fields.street, fields.zipcode)
    }
}

impl core::fmt::Display for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {} ({})", self.city, self.street, self.zipcode)
    }
}

impl ValueObject for Address {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_compare_by_value() {
        let a = Address::new("Seoul", "Gangnam-daero 1", "06000").unwrap();
        let b = Address::new("Seoul", "Gangnam-daero 1", "06000").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "Seoul Gangnam-daero 1 (06000)");
    }

    #[test]
    fn loading_applies_the_same_rules() {
        let a = Address::new("Busan", "Haeundae-ro 5", "48000").unwrap();
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(serde_json::from_value::<Address>(json).unwrap(), a);

        let blank = serde_json::json!({ "city": " ", "street": "x", "zipcode": "1" });
        let err = serde_json::from_value::<Address>(blank).unwrap_err();
        assert!(err.to_string().contains("city cannot be empty"));
    }

    #[test]
    fn blank_city_is_rejected() {
        assert!(matches!(
            Address::new("  ", "x", "1"),
            Err(DomainError::Validation(_))
        ));
    }
}
