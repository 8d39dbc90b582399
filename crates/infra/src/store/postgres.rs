//! Postgres-backed ledger and movement stores.
//!
//! Per-key atomicity:
//! - ledger upserts are single `INSERT ... ON CONFLICT DO UPDATE` statements;
//! - the movement compare-and-merge runs in a transaction that locks the row
//!   (`SELECT ... FOR UPDATE`), folds the patch with the domain merge, and
//!   writes the result back.
//!
//! All sqlx failures map to `StoreError::Unavailable`; there is no retry
//! here — the consumer owns backoff and the transport owns redelivery.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use wareflow_core::{MovementId, ProductId, WarehouseId};
use wareflow_movements::{Movement, MovementPatch, WarehouseStock};

use super::r#trait::{LedgerStore, MovementStore, StoreError};

/// Create the backing tables if they do not exist yet (idempotent).
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS warehouse_stocks (
            warehouse_id TEXT    NOT NULL,
            product_id   TEXT    NOT NULL,
            quantity     BIGINT  NOT NULL DEFAULT 0 CHECK (quantity >= 0),
            PRIMARY KEY (warehouse_id, product_id)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(to_store_error)?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movements (
            movement_id             TEXT PRIMARY KEY,
            product_id              TEXT NOT NULL,
            source_warehouse        TEXT NULL,
            destination_warehouse   TEXT NULL,
            departure_time          TIMESTAMPTZ NULL,
            departure_quantity      BIGINT NULL,
            arrival_time            TIMESTAMPTZ NULL,
            arrival_quantity        BIGINT NULL,
            time_difference_seconds DOUBLE PRECISION NULL,
            quantity_difference     BIGINT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(to_store_error)?;

    Ok(())
}

fn to_store_error(e: sqlx::Error) -> StoreError {
    StoreError::unavailable(e.to_string())
}

fn parse_id<T: FromStr>(raw: String, column: &str) -> Result<T, StoreError> {
    raw.parse()
        .map_err(|_| StoreError::unavailable(format!("corrupt {column} in stored row")))
}

/// Postgres quantity ledger.
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: Arc<PgPool>,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    #[instrument(skip(self), fields(warehouse_id = %warehouse_id, product_id = %product_id), err)]
    async fn get(
        &self,
        warehouse_id: &WarehouseId,
        product_id: &ProductId,
    ) -> Result<Option<WarehouseStock>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT warehouse_id, product_id, quantity
            FROM warehouse_stocks
            WHERE warehouse_id = $1 AND product_id = $2
            "#,
        )
        .bind(warehouse_id.as_str())
        .bind(product_id.as_str())
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(to_store_error)?;

        match row {
            None => Ok(None),
            Some(row) => Ok(Some(WarehouseStock {
                warehouse_id: parse_id(row.try_get("warehouse_id").map_err(to_store_error)?, "warehouse_id")?,
                product_id: parse_id(row.try_get("product_id").map_err(to_store_error)?, "product_id")?,
                quantity: row.try_get("quantity").map_err(to_store_error)?,
            })),
        }
    }

    #[instrument(skip(self, stock), fields(warehouse_id = %stock.warehouse_id, product_id = %stock.product_id), err)]
    async fn upsert(&self, stock: WarehouseStock) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO warehouse_stocks (warehouse_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (warehouse_id, product_id)
            DO UPDATE SET quantity = EXCLUDED.quantity
            "#,
        )
        .bind(stock.warehouse_id.as_str())
        .bind(stock.product_id.as_str())
        .bind(stock.quantity)
        .execute(self.pool.as_ref())
        .await
        .map_err(to_store_error)?;

        Ok(())
    }
}

/// Postgres movement record store.
#[derive(Debug, Clone)]
pub struct PostgresMovementStore {
    pool: Arc<PgPool>,
}

impl PostgresMovementStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    fn movement_from_row(row: &sqlx::postgres::PgRow) -> Result<Movement, StoreError> {
        let source: Option<String> = row.try_get("source_warehouse").map_err(to_store_error)?;
        let destination: Option<String> =
            row.try_get("destination_warehouse").map_err(to_store_error)?;

        Ok(Movement {
            movement_id: parse_id(row.try_get("movement_id").map_err(to_store_error)?, "movement_id")?,
            product_id: parse_id(row.try_get("product_id").map_err(to_store_error)?, "product_id")?,
            source_warehouse: source
                .map(|s| parse_id(s, "source_warehouse"))
                .transpose()?,
            destination_warehouse: destination
                .map(|s| parse_id(s, "destination_warehouse"))
                .transpose()?,
            departure_time: row.try_get("departure_time").map_err(to_store_error)?,
            departure_quantity: row.try_get("departure_quantity").map_err(to_store_error)?,
            arrival_time: row.try_get("arrival_time").map_err(to_store_error)?,
            arrival_quantity: row.try_get("arrival_quantity").map_err(to_store_error)?,
            time_difference_seconds: row
                .try_get("time_difference_seconds")
                .map_err(to_store_error)?,
            quantity_difference: row.try_get("quantity_difference").map_err(to_store_error)?,
        })
    }
}

const MOVEMENT_COLUMNS: &str = r#"
    movement_id, product_id, source_warehouse, destination_warehouse,
    departure_time, departure_quantity, arrival_time, arrival_quantity,
    time_difference_seconds, quantity_difference
"#;

#[async_trait]
impl MovementStore for PostgresMovementStore {
    #[instrument(skip(self), fields(movement_id = %movement_id), err)]
    async fn get(&self, movement_id: &MovementId) -> Result<Option<Movement>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE movement_id = $1"
        ))
        .bind(movement_id.as_str())
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(to_store_error)?;

        row.as_ref().map(Self::movement_from_row).transpose()
    }

    #[instrument(skip(self, patch), fields(movement_id = %movement_id), err)]
    async fn merge(
        &self,
        movement_id: &MovementId,
        product_id: &ProductId,
        patch: MovementPatch,
    ) -> Result<Movement, StoreError> {
        let mut tx = self.pool.begin().await.map_err(to_store_error)?;

        let existing = sqlx::query(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE movement_id = $1 FOR UPDATE"
        ))
        .bind(movement_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(to_store_error)?;

        let mut movement = match existing {
            Some(row) => Self::movement_from_row(&row)?,
            None => Movement::new(movement_id.clone(), product_id.clone()),
        };
        movement.merge(patch);

        sqlx::query(
            r#"
            INSERT INTO movements (
                movement_id, product_id, source_warehouse, destination_warehouse,
                departure_time, departure_quantity, arrival_time, arrival_quantity,
                time_difference_seconds, quantity_difference
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (movement_id) DO UPDATE SET
                source_warehouse        = EXCLUDED.source_warehouse,
                destination_warehouse   = EXCLUDED.destination_warehouse,
                departure_time          = EXCLUDED.departure_time,
                departure_quantity      = EXCLUDED.departure_quantity,
                arrival_time            = EXCLUDED.arrival_time,
                arrival_quantity        = EXCLUDED.arrival_quantity,
                time_difference_seconds = EXCLUDED.time_difference_seconds,
                quantity_difference     = EXCLUDED.quantity_difference
            "#,
        )
        .bind(movement.movement_id.as_str())
        .bind(movement.product_id.as_str())
        .bind(movement.source_warehouse.as_ref().map(|w| w.as_str()))
        .bind(movement.destination_warehouse.as_ref().map(|w| w.as_str()))
        .bind(movement.departure_time)
        .bind(movement.departure_quantity)
        .bind(movement.arrival_time)
        .bind(movement.arrival_quantity)
        .bind(movement.time_difference_seconds)
        .bind(movement.quantity_difference)
        .execute(&mut *tx)
        .await
        .map_err(to_store_error)?;

        tx.commit().await.map_err(to_store_error)?;

        Ok(movement)
    }
}
