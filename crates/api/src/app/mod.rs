//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store/engine/cache wiring shared by the server and the
//!   consumer thread
//! - `routes/`: HTTP routes and handlers
//! - `dto.rs`: response DTOs and JSON mapping
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/", get(routes::system::root))
        .route("/health", get(routes::system::health))
        .nest("/api", routes::router())
        .layer(Extension(services))
}
