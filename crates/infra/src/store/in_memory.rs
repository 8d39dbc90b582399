use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use wareflow_core::{MovementId, ProductId, WarehouseId};
use wareflow_movements::{Movement, MovementPatch, WarehouseStock};

use super::r#trait::{LedgerStore, MovementStore, StoreError};

/// In-memory quantity ledger.
///
/// Intended for tests/dev. Mutations are atomic per key by virtue of the
/// map-wide write lock.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    inner: RwLock<HashMap<(WarehouseId, ProductId), WarehouseStock>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn get(
        &self,
        warehouse_id: &WarehouseId,
        product_id: &ProductId,
    ) -> Result<Option<WarehouseStock>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::unavailable("ledger lock poisoned"))?;
        Ok(map
            .get(&(warehouse_id.clone(), product_id.clone()))
            .cloned())
    }

    async fn upsert(&self, stock: WarehouseStock) -> Result<(), StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| StoreError::unavailable("ledger lock poisoned"))?;
        map.insert(
            (stock.warehouse_id.clone(), stock.product_id.clone()),
            stock,
        );
        Ok(())
    }
}

/// In-memory movement record store.
#[derive(Debug, Default)]
pub struct InMemoryMovementStore {
    inner: RwLock<HashMap<MovementId, Movement>>,
}

impl InMemoryMovementStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MovementStore for InMemoryMovementStore {
    async fn get(&self, movement_id: &MovementId) -> Result<Option<Movement>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::unavailable("movement lock poisoned"))?;
        Ok(map.get(movement_id).cloned())
    }

    async fn merge(
        &self,
        movement_id: &MovementId,
        product_id: &ProductId,
        patch: MovementPatch,
    ) -> Result<Movement, StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| StoreError::unavailable("movement lock poisoned"))?;

        // Read-modify-write under the write lock: atomic per key.
        let movement = map
            .entry(movement_id.clone())
            .or_insert_with(|| Movement::new(movement_id.clone(), product_id.clone()));
        movement.merge(patch);

        Ok(movement.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn t(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn merge_creates_then_preserves_other_side() {
        let store = InMemoryMovementStore::new();
        let mid = MovementId::new("MOV-1").unwrap();
        let pid = ProductId::new("PROD-1").unwrap();

        let after_departure = store
            .merge(
                &mid,
                &pid,
                MovementPatch::Departure {
                    warehouse_id: WarehouseId::new("WH-1").unwrap(),
                    time: t("2023-04-01T10:00:00Z"),
                    quantity: 50,
                },
            )
            .await
            .unwrap();
        assert_eq!(after_departure.departure_quantity, Some(50));
        assert_eq!(after_departure.arrival_quantity, None);

        let after_arrival = store
            .merge(
                &mid,
                &pid,
                MovementPatch::Arrival {
                    warehouse_id: WarehouseId::new("WH-2").unwrap(),
                    time: t("2023-04-01T12:00:00Z"),
                    quantity: 50,
                },
            )
            .await
            .unwrap();

        // The departure side survived the arrival merge.
        assert_eq!(after_arrival.departure_quantity, Some(50));
        assert_eq!(after_arrival.time_difference_seconds, Some(7200.0));

        let stored = store.get(&mid).await.unwrap().unwrap();
        assert_eq!(stored, after_arrival);
    }

    #[tokio::test]
    async fn ledger_get_misses_for_unknown_key() {
        let store = InMemoryLedgerStore::new();
        let found = store
            .get(
                &WarehouseId::new("WH-9").unwrap(),
                &ProductId::new("PROD-9").unwrap(),
            )
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
