//! The inbound event payload: one half of a movement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wareflow_core::{DomainError, MovementId, ProductId, WarehouseId};

/// Which half of a movement an event describes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Departure,
    Arrival,
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EventKind::Departure => f.write_str("departure"),
            EventKind::Arrival => f.write_str("arrival"),
        }
    }
}

/// A single departure or arrival observation.
///
/// Consumed exactly once logically; the transport may redeliver it, so every
/// downstream consumer must tolerate duplicates.
///
/// The wire field for the kind is `event` (upstream feed contract).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub movement_id: MovementId,
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "event")]
    pub kind: EventKind,
    pub quantity: i64,
}

impl InboundEvent {
    /// Semantic validation beyond what serde enforces structurally.
    ///
    /// Quantity must be strictly positive; zero-quantity events carry no
    /// information and negative ones would invert the ledger arithmetic.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.quantity <= 0 {
            return Err(DomainError::validation(format!(
                "quantity must be positive, got {}",
                self.quantity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(quantity: i64) -> InboundEvent {
        InboundEvent {
            movement_id: MovementId::new("MOV-1").unwrap(),
            warehouse_id: WarehouseId::new("WH-1").unwrap(),
            product_id: ProductId::new("PROD-1").unwrap(),
            timestamp: Utc::now(),
            kind: EventKind::Departure,
            quantity,
        }
    }

    #[test]
    fn positive_quantity_passes_validation() {
        assert!(event(1).validate().is_ok());
    }

    #[test]
    fn zero_and_negative_quantities_fail_validation() {
        assert!(event(0).validate().is_err());
        assert!(event(-5).validate().is_err());
    }

    #[test]
    fn kind_uses_lowercase_wire_names() {
        let json = serde_json::to_value(&event(3)).unwrap();
        assert_eq!(json["event"], "departure");

        let parsed: InboundEvent = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.kind, EventKind::Departure);
    }

    #[test]
    fn unknown_kind_is_rejected_at_decode() {
        let raw = serde_json::json!({
            "movement_id": "MOV-1",
            "warehouse_id": "WH-1",
            "product_id": "PROD-1",
            "timestamp": "2023-04-01T10:00:00Z",
            "event": "teleport",
            "quantity": 5,
        });
        assert!(serde_json::from_value::<InboundEvent>(raw).is_err());
    }
}
