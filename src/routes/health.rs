use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

#[axum::debug_handler]
pub async fn health() -> impl IntoResponse {
    let body = json!({
        "status": "ok",
        "message": "Document to MCQ generator API is running",
    });
    (StatusCode::OK, Json(body))
}
