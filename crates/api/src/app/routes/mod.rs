use axum::Router;

pub mod movements;
pub mod system;
pub mod warehouses;

/// Router for the `/api` query surface.
pub fn router() -> Router {
    Router::new()
        .merge(movements::router())
        .merge(warehouses::router())
}
