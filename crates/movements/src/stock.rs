//! Per-warehouse, per-product stock level.

use serde::{Deserialize, Serialize};

use wareflow_core::{DomainError, ProductId, WarehouseId};

/// Current quantity of one product at one warehouse.
///
/// Invariant: `quantity >= 0` at all times. A withdrawal that would break
/// the invariant is rejected without mutating state. Records are created
/// implicitly at quantity 0 on first reference and never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseStock {
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
    pub quantity: i64,
}

impl WarehouseStock {
    /// Empty record for a key that has not been seen yet.
    pub fn empty(warehouse_id: WarehouseId, product_id: ProductId) -> Self {
        Self {
            warehouse_id,
            product_id,
            quantity: 0,
        }
    }

    /// Remove stock for a departure.
    ///
    /// Fails with `InsufficientStock` when the ledger holds less than
    /// requested; `self` is untouched in that case.
    pub fn withdraw(&mut self, quantity: i64) -> Result<(), DomainError> {
        if self.quantity < quantity {
            return Err(DomainError::insufficient_stock(quantity, self.quantity));
        }
        self.quantity -= quantity;
        Ok(())
    }

    /// Add stock for an arrival. Arrivals are never rejected.
    pub fn deposit(&mut self, quantity: i64) {
        self.quantity += quantity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(quantity: i64) -> WarehouseStock {
        WarehouseStock {
            warehouse_id: WarehouseId::new("WH-1").unwrap(),
            product_id: ProductId::new("PROD-1").unwrap(),
            quantity,
        }
    }

    #[test]
    fn withdraw_within_balance_succeeds() {
        let mut s = stock(100);
        s.withdraw(40).unwrap();
        assert_eq!(s.quantity, 60);
    }

    #[test]
    fn overdraw_is_rejected_without_mutation() {
        let mut s = stock(30);
        let err = s.withdraw(50).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientStock {
                required: 50,
                available: 30
            }
        );
        assert_eq!(s.quantity, 30);
    }

    #[test]
    fn deposit_accumulates() {
        let mut s = stock(0);
        s.deposit(100);
        s.deposit(1);
        assert_eq!(s.quantity, 101);
    }
}
