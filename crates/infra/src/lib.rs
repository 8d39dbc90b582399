//! Infrastructure layer: storage, caching, the reconciliation engine, and
//! the transport-facing event consumer.

pub mod cache;
pub mod consumer;
pub mod engine;
pub mod read;
pub mod store;


pub use cache::ReadCache;
pub use consumer::{
    Consumer, ConsumerHandle, EventTransport, InMemoryTransport, RedisStreamsTransport,
    TransportError, TransportMessage,
};
pub use engine::{ApplyOutcome, ReconciliationEngine};
pub use read::ReadService;
pub use store::{LedgerStore, MovementStore, StoreError};
