//! Stored mapsets.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use playcount_core::coordinator;
use playcount_core::stats::observation_time;
use playcount_core::{Mapset, MapsetSnapshot};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::mapset::{
    BeatmapResponse, MAX_PAGE_SIZE, MapsetPageQuery, MapsetPageResponse, MapsetResponse,
};
use crate::schemas::track::OutcomeResponse;
use crate::schemas::user_card::MapsetCommand;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_mapsets, get_mapset, create_mapset),
    components(schemas(MapsetPageResponse, MapsetResponse, BeatmapResponse, MapsetCommand))
)]
pub struct MapsetsApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/mapsets", get(list_mapsets))
        .route("/mapsets/create", post(create_mapset))
        .route("/mapsets/{id}", get(get_mapset))
}

#[utoipa::path(
    get,
    path = "/mapsets",
    tag = "mapsets",
    params(MapsetPageQuery),
    responses(
        (status = 200, description = "One page of mapsets ordered by ID", body = MapsetPageResponse),
        (status = 400, description = "Invalid page parameters"),
    )
)]
pub async fn list_mapsets(
    State(state): State<Arc<AppState>>,
    query: Result<Query<MapsetPageQuery>, QueryRejection>,
) -> Result<Json<MapsetPageResponse>, ServerError> {
    let Query(query) = query?;
    let offset = (query.page >= 1 && (1..=MAX_PAGE_SIZE).contains(&query.page_size))
        .then(|| (query.page - 1).checked_mul(query.page_size))
        .flatten()
        .ok_or_else(|| {
            ServerError::BadRequest(format!(
                "page must be >= 1 and page_size within 1..={MAX_PAGE_SIZE}, and their product must fit in 64 bits"
            ))
        })?;

    let mut uow = state.store.read_only().await?;
    let total = uow.count_mapsets().await?;
    let mapsets = uow.list_mapsets(query.page_size, offset).await?;
    Ok(Json(MapsetPageResponse {
        items: mapsets
            .into_iter()
            .map(MapsetResponse::try_from)
            .collect::<Result<_, _>>()?,
        page: query.page,
        page_size: query.page_size,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/mapsets/{id}",
    tag = "mapsets",
    params(("id" = i64, Path, description = "osu! beatmapset ID")),
    responses(
        (status = 200, description = "Mapset with its beatmaps", body = MapsetResponse),
        (status = 404, description = "Mapset not stored"),
    )
)]
pub async fn get_mapset(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MapsetResponse>, ServerError> {
    let Path(id) = id?;
    let mut uow = state.store.read_only().await?;
    let mapset: Mapset = uow.get(id).await?;
    let beatmaps = uow.list_beatmaps_for_mapset(id).await?;
    Ok(Json(MapsetResponse::with_beatmaps(mapset, beatmaps)?))
}

#[utoipa::path(
    post,
    path = "/mapsets/create",
    tag = "mapsets",
    request_body = MapsetCommand,
    responses(
        (status = 200, description = "Mapset and beatmaps stored", body = OutcomeResponse),
        (status = 400, description = "Malformed body"),
        (status = 404, description = "Owner not stored"),
        (status = 409, description = "Mapset already exists"),
    )
)]
pub async fn create_mapset(
    State(state): State<Arc<AppState>>,
    body: Result<Json<MapsetCommand>, JsonRejection>,
) -> Result<Json<OutcomeResponse>, ServerError> {
    let Json(body) = body?;
    let snapshot = MapsetSnapshot::from(body);
    let outcome = coordinator::apply_mapset(&state.store, &snapshot, observation_time(Utc::now())).await?;
    Ok(Json(outcome.into()))
}
