//! Durable keyed stores for the quantity ledger and movement records.

mod in_memory;
mod postgres;
mod r#trait;

pub use in_memory::{InMemoryLedgerStore, InMemoryMovementStore};
pub use postgres::{PostgresLedgerStore, PostgresMovementStore, ensure_schema};
pub use r#trait::{LedgerStore, MovementStore, StoreError};
