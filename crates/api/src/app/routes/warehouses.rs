use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use wareflow_core::{ProductId, WarehouseId};

use crate::app::{dto, errors, services::AppServices};

pub fn router() -> Router {
    Router::new().route(
        "/warehouses/:warehouse_id/products/:product_id",
        get(get_warehouse_stock),
    )
}

/// Current stock for a (warehouse, product) key. Keys that have never seen an
/// event report quantity 0 rather than 404.
pub async fn get_warehouse_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path((warehouse_id, product_id)): Path<(String, String)>,
) -> axum::response::Response {
    let warehouse_id = match WarehouseId::new(warehouse_id) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let product_id = match ProductId::new(product_id) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.read.stock(&warehouse_id, &product_id).await {
        Ok(stock) => Json(dto::StockView::from(stock)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
