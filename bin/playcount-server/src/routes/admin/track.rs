//! Manual tracking pass.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::track::TrackReportResponse;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(track_now), components(schemas(TrackReportResponse)))]
pub struct AdminTrackApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/track", post(track_now))
}

/// Run a pass over every followed user and wait for it to finish.
#[utoipa::path(
    post,
    path = "/admin/track",
    tag = "admin",
    responses(
        (status = 200, description = "Pass completed", body = TrackReportResponse),
        (status = 401, description = "Unauthorised (admin token required)"),
        (status = 409, description = "Nobody followed, or a pass is already running"),
        (status = 502, description = "The osu! API failed for one user; the pass stopped there"),
    )
)]
pub async fn track_now(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TrackReportResponse>, ServerError> {
    let report = state.tracker.track().await?;
    Ok(Json(report.into()))
}
