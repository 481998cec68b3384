//! Tracking status.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::track::LastTrackResponse;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(last_tracked), components(schemas(LastTrackResponse)))]
pub struct TrackApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/track/last", get(last_tracked))
}

#[utoipa::path(
    get,
    path = "/track/last",
    tag = "track",
    responses(
        (status = 200, description = "When the last tracking pass completed", body = LastTrackResponse),
    )
)]
pub async fn last_tracked(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LastTrackResponse>, ServerError> {
    Ok(Json(LastTrackResponse {
        tracked_at: state.tracker.last_tracked().await?,
    }))
}
