//! The reconciliation engine: applies one inbound event to the ledger and
//! movement stores.
//!
//! The engine holds no state of its own between calls — every `apply` is a
//! function of (stored state, incoming event). Either side of a movement may
//! arrive first, separated by an arbitrary delay; reconciliation merges the
//! event into whatever partial record exists rather than running a rigid
//! two-phase protocol.

use std::sync::Arc;

use tracing::{debug, warn};

use wareflow_core::DomainError;
use wareflow_events::{EventKind, InboundEvent};
use wareflow_movements::{Movement, MovementPatch, WarehouseStock};

use crate::cache::ReadCache;
use crate::store::{LedgerStore, MovementStore, StoreError};

/// Result of applying one event.
///
/// Rejections are terminal for the event and mutate nothing; they are
/// business conditions, not faults, and must not halt consumption. Store
/// failures surface as `Err(StoreError)` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The event's side of the movement was already recorded with identical
    /// values; nothing was mutated.
    Duplicate,
    Rejected(DomainError),
}

pub struct ReconciliationEngine<L, M> {
    ledger: L,
    movements: M,
    cache: Arc<ReadCache>,
}

impl<L, M> ReconciliationEngine<L, M>
where
    L: LedgerStore,
    M: MovementStore,
{
    pub fn new(ledger: L, movements: M, cache: Arc<ReadCache>) -> Self {
        Self {
            ledger,
            movements,
            cache,
        }
    }

    /// Apply one inbound event to both stores.
    ///
    /// - an event whose side is already recorded with identical values is a
    ///   no-op (at-least-once transports redeliver);
    /// - departures are rejected when they would drive the ledger negative;
    /// - arrivals are never rejected;
    /// - the movement record merge recomputes the derived deltas whenever
    ///   both sides are present;
    /// - cache entries for the touched ledger key and movement_id are
    ///   invalidated after the corresponding store write commits.
    pub async fn apply(&self, event: &InboundEvent) -> Result<ApplyOutcome, StoreError> {
        if let Err(e) = event.validate() {
            warn!(
                movement_id = %event.movement_id,
                error = %e,
                "dropping invalid event"
            );
            return Ok(ApplyOutcome::Rejected(e));
        }

        if let Some(existing) = self.movements.get(&event.movement_id).await? {
            if side_matches(&existing, event) {
                debug!(
                    movement_id = %event.movement_id,
                    kind = %event.kind,
                    "identical side re-delivered, ignoring"
                );
                return Ok(ApplyOutcome::Duplicate);
            }
        }

        let mut stock = self
            .ledger
            .get(&event.warehouse_id, &event.product_id)
            .await?
            .unwrap_or_else(|| {
                WarehouseStock::empty(event.warehouse_id.clone(), event.product_id.clone())
            });

        match event.kind {
            EventKind::Departure => {
                if let Err(e) = stock.withdraw(event.quantity) {
                    warn!(
                        movement_id = %event.movement_id,
                        warehouse_id = %event.warehouse_id,
                        product_id = %event.product_id,
                        error = %e,
                        "departure rejected"
                    );
                    return Ok(ApplyOutcome::Rejected(e));
                }
            }
            EventKind::Arrival => stock.deposit(event.quantity),
        }

        let remaining = stock.quantity;
        self.ledger.upsert(stock).await?;
        self.cache
            .invalidate_stock(&event.warehouse_id, &event.product_id);

        let patch = match event.kind {
            EventKind::Departure => MovementPatch::Departure {
                warehouse_id: event.warehouse_id.clone(),
                time: event.timestamp,
                quantity: event.quantity,
            },
            EventKind::Arrival => MovementPatch::Arrival {
                warehouse_id: event.warehouse_id.clone(),
                time: event.timestamp,
                quantity: event.quantity,
            },
        };

        let movement = self
            .movements
            .merge(&event.movement_id, &event.product_id, patch)
            .await?;
        self.cache.invalidate_movement(&event.movement_id);

        debug!(
            movement_id = %event.movement_id,
            kind = %event.kind,
            quantity = event.quantity,
            remaining,
            state = ?movement.state(),
            "event applied"
        );

        Ok(ApplyOutcome::Applied)
    }
}

/// True when the event's side is already recorded with identical values.
///
/// A side re-delivered with *different* values is not a duplicate: upstream
/// corrections overwrite the prior side and the ledger arithmetic runs again.
fn side_matches(movement: &Movement, event: &InboundEvent) -> bool {
    match event.kind {
        EventKind::Departure => {
            movement.source_warehouse.as_ref() == Some(&event.warehouse_id)
                && movement.departure_time == Some(event.timestamp)
                && movement.departure_quantity == Some(event.quantity)
        }
        EventKind::Arrival => {
            movement.destination_warehouse.as_ref() == Some(&event.warehouse_id)
                && movement.arrival_time == Some(event.timestamp)
                && movement.arrival_quantity == Some(event.quantity)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use wareflow_core::{MovementId, ProductId, WarehouseId};
    use wareflow_movements::MovementState;

    use crate::store::{InMemoryLedgerStore, InMemoryMovementStore};

    type TestEngine = ReconciliationEngine<Arc<InMemoryLedgerStore>, Arc<InMemoryMovementStore>>;

    fn setup() -> (TestEngine, Arc<InMemoryLedgerStore>, Arc<InMemoryMovementStore>) {
        let ledger = Arc::new(InMemoryLedgerStore::new());
        let movements = Arc::new(InMemoryMovementStore::new());
        let cache = Arc::new(ReadCache::new(64));
        let engine = ReconciliationEngine::new(ledger.clone(), movements.clone(), cache);
        (engine, ledger, movements)
    }

    fn event(
        movement: &str,
        kind: EventKind,
        warehouse: &str,
        quantity: i64,
        time: &str,
    ) -> InboundEvent {
        InboundEvent {
            movement_id: MovementId::new(movement).unwrap(),
            warehouse_id: WarehouseId::new(warehouse).unwrap(),
            product_id: ProductId::new("PROD-1").unwrap(),
            timestamp: time.parse::<DateTime<Utc>>().unwrap(),
            kind,
            quantity,
        }
    }

    /// Seed stock via a plain arrival under a throwaway movement id.
    async fn seed(engine: &TestEngine, warehouse: &str, quantity: i64) {
        let outcome = engine
            .apply(&event(
                "SEED",
                EventKind::Arrival,
                warehouse,
                quantity,
                "2023-04-01T00:00:00Z",
            ))
            .await
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied);
    }

    async fn quantity(ledger: &InMemoryLedgerStore, warehouse: &str) -> i64 {
        ledger
            .get(
                &WarehouseId::new(warehouse).unwrap(),
                &ProductId::new("PROD-1").unwrap(),
            )
            .await
            .unwrap()
            .map(|s| s.quantity)
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn arrival_into_empty_ledger_creates_stock() {
        let (engine, ledger, _) = setup();

        let outcome = engine
            .apply(&event(
                "MOV-1",
                EventKind::Arrival,
                "WH-1",
                100,
                "2023-04-01T10:00:00Z",
            ))
            .await
            .unwrap();

        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(quantity(&ledger, "WH-1").await, 100);
    }

    #[tokio::test]
    async fn departure_then_arrival_reconciles() {
        let (engine, ledger, movements) = setup();
        seed(&engine, "WH-1", 100).await;

        engine
            .apply(&event(
                "MOV-1",
                EventKind::Departure,
                "WH-1",
                50,
                "2023-04-01T10:00:00Z",
            ))
            .await
            .unwrap();
        engine
            .apply(&event(
                "MOV-1",
                EventKind::Arrival,
                "WH-2",
                50,
                "2023-04-01T12:00:00Z",
            ))
            .await
            .unwrap();

        assert_eq!(quantity(&ledger, "WH-1").await, 50);
        assert_eq!(quantity(&ledger, "WH-2").await, 50);

        let m = movements
            .get(&MovementId::new("MOV-1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(m.state(), MovementState::Reconciled);
        assert_eq!(m.source_warehouse, Some(WarehouseId::new("WH-1").unwrap()));
        assert_eq!(
            m.destination_warehouse,
            Some(WarehouseId::new("WH-2").unwrap())
        );
        assert_eq!(m.time_difference_seconds, Some(7200.0));
        assert_eq!(m.quantity_difference, Some(0));
    }

    #[tokio::test]
    async fn order_independence_converges_to_same_record() {
        let (forward, f_ledger, f_movements) = setup();
        let (reverse, r_ledger, r_movements) = setup();

        let departure = event(
            "MOV-1",
            EventKind::Departure,
            "WH-1",
            50,
            "2023-04-01T10:00:00Z",
        );
        let arrival = event(
            "MOV-1",
            EventKind::Arrival,
            "WH-2",
            50,
            "2023-04-01T12:00:00Z",
        );

        seed(&forward, "WH-1", 100).await;
        forward.apply(&departure).await.unwrap();
        forward.apply(&arrival).await.unwrap();

        seed(&reverse, "WH-1", 100).await;
        reverse.apply(&arrival).await.unwrap();
        reverse.apply(&departure).await.unwrap();

        let mid = MovementId::new("MOV-1").unwrap();
        assert_eq!(
            f_movements.get(&mid).await.unwrap(),
            r_movements.get(&mid).await.unwrap()
        );
        assert_eq!(
            quantity(&f_ledger, "WH-1").await,
            quantity(&r_ledger, "WH-1").await
        );
        assert_eq!(
            quantity(&f_ledger, "WH-2").await,
            quantity(&r_ledger, "WH-2").await
        );
    }

    #[tokio::test]
    async fn insufficient_stock_mutates_nothing() {
        let (engine, ledger, movements) = setup();
        seed(&engine, "WH-1", 30).await;

        let outcome = engine
            .apply(&event(
                "MOV-1",
                EventKind::Departure,
                "WH-1",
                50,
                "2023-04-01T10:00:00Z",
            ))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ApplyOutcome::Rejected(DomainError::InsufficientStock {
                required: 50,
                available: 30
            })
        );
        assert_eq!(quantity(&ledger, "WH-1").await, 30);
        // No departure side was recorded for the rejected event.
        assert!(movements
            .get(&MovementId::new("MOV-1").unwrap())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn identical_redelivery_changes_nothing() {
        let (engine, ledger, movements) = setup();
        seed(&engine, "WH-1", 100).await;

        let departure = event(
            "MOV-1",
            EventKind::Departure,
            "WH-1",
            50,
            "2023-04-01T10:00:00Z",
        );
        engine.apply(&departure).await.unwrap();

        let mid = MovementId::new("MOV-1").unwrap();
        let first = movements.get(&mid).await.unwrap().unwrap();

        let outcome = engine.apply(&departure).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Duplicate);
        assert_eq!(movements.get(&mid).await.unwrap().unwrap(), first);
        assert_eq!(quantity(&ledger, "WH-1").await, 50);
    }

    #[tokio::test]
    async fn corrected_redelivery_overwrites_the_side() {
        let (engine, ledger, movements) = setup();

        engine
            .apply(&event(
                "MOV-1",
                EventKind::Arrival,
                "WH-2",
                50,
                "2023-04-01T12:00:00Z",
            ))
            .await
            .unwrap();
        // Correction with a different quantity is not a duplicate.
        let outcome = engine
            .apply(&event(
                "MOV-1",
                EventKind::Arrival,
                "WH-2",
                45,
                "2023-04-01T12:00:00Z",
            ))
            .await
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied);

        let m = movements
            .get(&MovementId::new("MOV-1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(m.arrival_quantity, Some(45));
        // Ledger arithmetic ran again for the correction.
        assert_eq!(quantity(&ledger, "WH-2").await, 95);
    }

    #[tokio::test]
    async fn non_positive_quantity_is_rejected_without_mutation() {
        let (engine, ledger, movements) = setup();

        let mut bad = event(
            "MOV-1",
            EventKind::Arrival,
            "WH-1",
            10,
            "2023-04-01T10:00:00Z",
        );
        bad.quantity = 0;

        let outcome = engine.apply(&bad).await.unwrap();
        assert!(matches!(
            outcome,
            ApplyOutcome::Rejected(DomainError::Validation(_))
        ));
        assert_eq!(quantity(&ledger, "WH-1").await, 0);
        assert!(movements
            .get(&MovementId::new("MOV-1").unwrap())
            .await
            .unwrap()
            .is_none());
    }
}
