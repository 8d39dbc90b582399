use axum::Json;

pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "warehouse movement reconciliation service"
    }))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
