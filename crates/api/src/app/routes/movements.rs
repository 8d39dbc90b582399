use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use wareflow_core::MovementId;

use crate::app::{dto, errors, services::AppServices};

pub fn router() -> Router {
    Router::new().route("/movements/:movement_id", get(get_movement))
}

pub async fn get_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Path(movement_id): Path<String>,
) -> axum::response::Response {
    let movement_id = match MovementId::new(movement_id) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.read.movement(&movement_id).await {
        Ok(Some(movement)) => Json(dto::MovementView::from(movement)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "movement not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}
