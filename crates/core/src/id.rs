//! Strongly-typed identifiers used across the domain.
//!
//! The upstream feed addresses warehouses, products and movements by opaque
//! codes (`WH-1`, `PROD-1`, `MOV-1`), so these are string newtypes rather
//! than UUIDs. Identifiers are compared verbatim; no normalization.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WarehouseId(String);

/// Identifier of a product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

/// Identifier of a logical movement (shared by its departure and arrival events).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementId(String);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Wrap a raw identifier.
            ///
            /// Rejects empty/blank identifiers; everything else is accepted
            /// verbatim (the upstream system owns the code format).
            pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(DomainError::invalid_id(concat!($name, " cannot be empty")));
                }
                Ok(Self(id))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl core::str::FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

impl_string_newtype!(WarehouseId, "WarehouseId");
impl_string_newtype!(ProductId, "ProductId");
impl_string_newtype!(MovementId, "MovementId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_identifiers_are_rejected() {
        assert!(WarehouseId::new("  ").is_err());
        assert!(ProductId::new("").is_err());
        assert!(MovementId::new("MOV-1").is_ok());
    }

    #[test]
    fn identifiers_round_trip_through_display() {
        let id = WarehouseId::new("WH-1").unwrap();
        assert_eq!(id.to_string(), "WH-1");
        assert_eq!(id.as_str(), "WH-1");
    }
}
