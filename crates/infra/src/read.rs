//! Cache-through read path for the query surface.

use std::sync::Arc;

use wareflow_core::{MovementId, ProductId, WarehouseId};
use wareflow_movements::{Movement, WarehouseStock};

use crate::cache::ReadCache;
use crate::store::{LedgerStore, MovementStore, StoreError};

/// Read-only lookups against the stores, memoized through the shared cache.
///
/// Reads may race in-flight writes; they see either the old or the new value,
/// never a torn one (store mutations are atomic per key). Negative movement
/// lookups are not cached.
#[derive(Clone)]
pub struct ReadService {
    ledger: Arc<dyn LedgerStore>,
    movements: Arc<dyn MovementStore>,
    cache: Arc<ReadCache>,
}

impl ReadService {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        movements: Arc<dyn MovementStore>,
        cache: Arc<ReadCache>,
    ) -> Self {
        Self {
            ledger,
            movements,
            cache,
        }
    }

    /// Current stock for a key; unknown keys read as quantity 0, never a miss.
    pub async fn stock(
        &self,
        warehouse_id: &WarehouseId,
        product_id: &ProductId,
    ) -> Result<WarehouseStock, StoreError> {
        if let Some(hit) = self.cache.get_stock(warehouse_id, product_id) {
            return Ok(hit);
        }

        let stock = self
            .ledger
            .get(warehouse_id, product_id)
            .await?
            .unwrap_or_else(|| WarehouseStock::empty(warehouse_id.clone(), product_id.clone()));

        self.cache.put_stock(stock.clone());
        Ok(stock)
    }

    /// Movement record, or `None` for an unseen movement_id.
    pub async fn movement(&self, movement_id: &MovementId) -> Result<Option<Movement>, StoreError> {
        if let Some(hit) = self.cache.get_movement(movement_id) {
            return Ok(Some(hit));
        }

        let movement = self.movements.get(movement_id).await?;
        if let Some(m) = &movement {
            self.cache.put_movement(m.clone());
        }
        Ok(movement)
    }
}
