//! Response DTOs and JSON mapping.

use chrono::{DateTime, Utc};
use serde::Serialize;

use wareflow_movements::{Movement, WarehouseStock};

/// A movement record as returned by the API. Side fields are null until the
/// corresponding event has been observed; the derived fields are null until
/// both sides have.
#[derive(Debug, Serialize)]
pub struct MovementView {
    pub movement_id: String,
    pub source_warehouse: Option<String>,
    pub destination_warehouse: Option<String>,
    pub product_id: String,
    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub time_difference_seconds: Option<f64>,
    pub departure_quantity: Option<i64>,
    pub arrival_quantity: Option<i64>,
    pub quantity_difference: Option<i64>,
}

impl From<Movement> for MovementView {
    fn from(m: Movement) -> Self {
        Self {
            movement_id: m.movement_id.into(),
            source_warehouse: m.source_warehouse.map(Into::into),
            destination_warehouse: m.destination_warehouse.map(Into::into),
            product_id: m.product_id.into(),
            departure_time: m.departure_time,
            arrival_time: m.arrival_time,
            time_difference_seconds: m.time_difference_seconds,
            departure_quantity: m.departure_quantity,
            arrival_quantity: m.arrival_quantity,
            quantity_difference: m.quantity_difference,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StockView {
    pub warehouse_id: String,
    pub product_id: String,
    pub quantity: i64,
}

impl From<WarehouseStock> for StockView {
    fn from(s: WarehouseStock) -> Self {
        Self {
            warehouse_id: s.warehouse_id.into(),
            product_id: s.product_id.into(),
            quantity: s.quantity,
        }
    }
}
