//! A movement: one logical transfer evidenced by two events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wareflow_core::{MovementId, ProductId, WarehouseId};

/// Lifecycle position of a movement record.
///
/// Transitions are monotonic: a recorded side may be overwritten by a later
/// event for the same side, but never removed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementState {
    DepartureOnly,
    ArrivalOnly,
    Reconciled,
}

/// One side of a movement, as carried by a single inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovementPatch {
    Departure {
        warehouse_id: WarehouseId,
        time: DateTime<Utc>,
        quantity: i64,
    },
    Arrival {
        warehouse_id: WarehouseId,
        time: DateTime<Utc>,
        quantity: i64,
    },
}

/// Progressive reconciliation record for one movement.
///
/// Either side may be recorded first; the derived fields stay `None` until
/// both are present and are recomputed from scratch on every merge, so they
/// are never stale after a side is overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub movement_id: MovementId,
    pub product_id: ProductId,
    pub source_warehouse: Option<WarehouseId>,
    pub destination_warehouse: Option<WarehouseId>,
    pub departure_time: Option<DateTime<Utc>>,
    pub departure_quantity: Option<i64>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub arrival_quantity: Option<i64>,
    pub time_difference_seconds: Option<f64>,
    pub quantity_difference: Option<i64>,
}

impl Movement {
    /// Record with no sides yet (`product_id` is immutable once set here).
    pub fn new(movement_id: MovementId, product_id: ProductId) -> Self {
        Self {
            movement_id,
            product_id,
            source_warehouse: None,
            destination_warehouse: None,
            departure_time: None,
            departure_quantity: None,
            arrival_time: None,
            arrival_quantity: None,
            time_difference_seconds: None,
            quantity_difference: None,
        }
    }

    pub fn state(&self) -> MovementState {
        match (self.departure_time.is_some(), self.arrival_time.is_some()) {
            (true, true) => MovementState::Reconciled,
            (true, false) => MovementState::DepartureOnly,
            // A stored record always has at least one side.
            _ => MovementState::ArrivalOnly,
        }
    }

    /// Fold one side into the record.
    ///
    /// Re-delivery of the same side overwrites it (identical values are a
    /// no-op; differing values are taken as a correction from upstream).
    /// The other side is left untouched.
    pub fn merge(&mut self, patch: MovementPatch) {
        match patch {
            MovementPatch::Departure {
                warehouse_id,
                time,
                quantity,
            } => {
                self.source_warehouse = Some(warehouse_id);
                self.departure_time = Some(time);
                self.departure_quantity = Some(quantity);
            }
            MovementPatch::Arrival {
                warehouse_id,
                time,
                quantity,
            } => {
                self.destination_warehouse = Some(warehouse_id);
                self.arrival_time = Some(time);
                self.arrival_quantity = Some(quantity);
            }
        }
        self.recompute_differences();
    }

    /// Recompute the derived deltas from the two sides.
    ///
    /// `time_difference_seconds` is arrival minus departure and may be
    /// negative when events arrive with inverted business timestamps; the
    /// value is reported as-is, not clamped.
    fn recompute_differences(&mut self) {
        match (
            self.departure_time,
            self.arrival_time,
            self.departure_quantity,
            self.arrival_quantity,
        ) {
            (Some(dep_t), Some(arr_t), Some(dep_q), Some(arr_q)) => {
                let delta = arr_t.signed_duration_since(dep_t);
                self.time_difference_seconds =
                    Some(delta.num_milliseconds() as f64 / 1000.0);
                self.quantity_difference = Some(arr_q - dep_q);
            }
            _ => {
                self.time_difference_seconds = None;
                self.quantity_difference = None;
            }
        }
    }
}
