pub mod following;
pub mod track;

use std::sync::Arc;

use axum::{Router, middleware};
use utoipa::OpenApi;

use crate::middleware::auth;
use crate::state::AppState;

/// Routes nested under `/admin` (follow list, manual passes).
pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .merge(following::router())
        .merge(track::router())
        .route_layer(middleware::from_fn_with_state(state, auth::admin_auth))
}

#[derive(OpenApi)]
#[openapi()]
pub struct AdminApi;

pub fn api_docs() -> utoipa::openapi::OpenApi {
    let mut spec = AdminApi::openapi();
    spec.merge(following::FollowingApi::openapi());
    spec.merge(track::AdminTrackApi::openapi());
    spec
}
