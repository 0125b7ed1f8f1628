//! Service endpoints kept from the demo's node server.

use axum::body::Bytes;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

pub async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Placeholder for provider payment notifications; the payload is only logged.
pub async fn lightning_webhook(body: Bytes) -> Json<Value> {
    tracing::info!(body = %String::from_utf8_lossy(&body), "lightning webhook received");
    Json(json!({ "success": true }))
}

#[derive(Debug, Deserialize)]
pub struct GetInvoiceQuery {
    address: Option<String>,
    amount: Option<String>,
}

pub async fn get_invoice(Query(query): Query<GetInvoiceQuery>) -> (StatusCode, Json<Value>) {
    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
    if !present(&query.address) || !present(&query.amount) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "error": "Lightning address and amount are required",
            })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "This endpoint would generate or proxy an invoice request",
        })),
    )
}
