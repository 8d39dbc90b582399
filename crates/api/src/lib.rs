//! HTTP API: server bootstrap, routing, and request/response mapping.

pub mod app;
pub mod config;
pub mod telemetry;
