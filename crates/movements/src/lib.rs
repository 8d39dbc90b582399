//! Movement reconciliation domain.
//!
//! This crate contains the business rules for warehouse stock levels and for
//! merging the two halves of a movement, implemented purely as deterministic
//! domain logic (no IO, no HTTP, no storage).

pub mod movement;
pub mod stock;

pub use movement::{Movement, MovementPatch, MovementState};
pub use stock::WarehouseStock;
