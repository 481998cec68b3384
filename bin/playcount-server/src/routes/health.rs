//! Heartbeat endpoint.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(ping))]
pub struct HealthApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/ping", get(ping))
}

/// Returns `{"message": "pong", "version": "..."}` with HTTP 200.
#[utoipa::path(
    get,
    path = "/ping",
    tag = "health",
    responses(
        (status = 200, description = "Server is up", body = Value)
    )
)]
pub async fn ping() -> Json<Value> {
    Json(json!({
        "message": "pong",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
