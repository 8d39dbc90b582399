use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use wareflow_core::{MovementId, ProductId, WarehouseId};
use wareflow_movements::{Movement, MovementPatch, WarehouseStock};

/// Store operation error.
///
/// Infrastructure failures only; business rejections never surface here.
/// The consumer treats any store error as transient and backs off, leaving
/// the triggering message unacknowledged so the transport redelivers it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Keyed store of `(warehouse_id, product_id) -> WarehouseStock`.
///
/// Implementations must make each mutation atomic per key; the read-facing
/// query surface runs concurrently with the single writing consumer. A
/// missing key means quantity 0 (the engine materializes the empty record).
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn get(
        &self,
        warehouse_id: &WarehouseId,
        product_id: &ProductId,
    ) -> Result<Option<WarehouseStock>, StoreError>;

    async fn upsert(&self, stock: WarehouseStock) -> Result<(), StoreError>;
}

/// Keyed store of `movement_id -> Movement`.
#[async_trait]
pub trait MovementStore: Send + Sync {
    async fn get(&self, movement_id: &MovementId) -> Result<Option<Movement>, StoreError>;

    /// Compare-and-merge: fold one side into the stored record without
    /// clobbering the other side, creating the record if absent.
    ///
    /// Must be atomic per movement_id. Returns the merged record.
    async fn merge(
        &self,
        movement_id: &MovementId,
        product_id: &ProductId,
        patch: MovementPatch,
    ) -> Result<Movement, StoreError>;
}

#[async_trait]
impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    async fn get(
        &self,
        warehouse_id: &WarehouseId,
        product_id: &ProductId,
    ) -> Result<Option<WarehouseStock>, StoreError> {
        (**self).get(warehouse_id, product_id).await
    }

    async fn upsert(&self, stock: WarehouseStock) -> Result<(), StoreError> {
        (**self).upsert(stock).await
    }
}

#[async_trait]
impl<S> MovementStore for Arc<S>
where
    S: MovementStore + ?Sized,
{
    async fn get(&self, movement_id: &MovementId) -> Result<Option<Movement>, StoreError> {
        (**self).get(movement_id).await
    }

    async fn merge(
        &self,
        movement_id: &MovementId,
        product_id: &ProductId,
        patch: MovementPatch,
    ) -> Result<Movement, StoreError> {
        (**self).merge(movement_id, product_id, patch).await
    }
}
