//! Inbound inventory events and their transport envelope.
//!
//! This crate models the wire format consumed from the movement event stream:
//! a CloudEvents-style envelope wrapping one departure or arrival observation.
//! No IO lives here; decoding and validation only.

pub mod envelope;
pub mod inbound;

pub use envelope::{EventEnvelope, EventError};
pub use inbound::{EventKind, InboundEvent};
