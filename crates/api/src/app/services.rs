//! Service wiring shared by the HTTP server and the consumer thread.

use std::sync::Arc;

use sqlx::PgPool;

use wareflow_infra::store::{
    InMemoryLedgerStore, InMemoryMovementStore, LedgerStore, MovementStore, PostgresLedgerStore,
    PostgresMovementStore,
};
use wareflow_infra::{ReadCache, ReadService, ReconciliationEngine};

/// The engine with its store backends type-erased, so the in-memory and
/// Postgres wirings produce the same type.
pub type SharedEngine = ReconciliationEngine<Arc<dyn LedgerStore>, Arc<dyn MovementStore>>;

pub struct AppServices {
    pub read: ReadService,
}

/// Wire the engine and read service over a pair of stores.
fn wire(
    ledger: Arc<dyn LedgerStore>,
    movements: Arc<dyn MovementStore>,
    cache_capacity: usize,
) -> (Arc<AppServices>, Arc<SharedEngine>) {
    let cache = Arc::new(ReadCache::new(cache_capacity));
    let engine = Arc::new(ReconciliationEngine::new(
        ledger.clone(),
        movements.clone(),
        cache.clone(),
    ));
    let services = Arc::new(AppServices {
        read: ReadService::new(ledger, movements, cache),
    });
    (services, engine)
}

pub fn build_in_memory(cache_capacity: usize) -> (Arc<AppServices>, Arc<SharedEngine>) {
    wire(
        Arc::new(InMemoryLedgerStore::new()),
        Arc::new(InMemoryMovementStore::new()),
        cache_capacity,
    )
}

pub fn build_postgres(pool: PgPool, cache_capacity: usize) -> (Arc<AppServices>, Arc<SharedEngine>) {
    wire(
        Arc::new(PostgresLedgerStore::new(pool.clone())),
        Arc::new(PostgresMovementStore::new(pool)),
        cache_capacity,
    )
}
