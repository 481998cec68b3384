//! User-card commands: a user with all of their mapsets in one body.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use playcount_core::coordinator::{self, CardCommand};
use playcount_core::stats::observation_time;
use playcount_core::{User, UserCard};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::mapset::MapsetResponse;
use crate::schemas::track::OutcomeResponse;
use crate::schemas::user::UserResponse;
use crate::schemas::user_card::{BeatmapCommand, MapsetCommand, UserCardRequest, UserCardResponse, UserCommand};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(create_user_card, update_user_card, get_user_card),
    components(schemas(
        UserCardRequest,
        UserCommand,
        MapsetCommand,
        BeatmapCommand,
        UserCardResponse,
        OutcomeResponse,
    ))
)]
pub struct UserCardApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user_card/create", post(create_user_card))
        .route("/user_card/update", post(update_user_card))
        .route("/user_card/{id}", get(get_user_card))
}

async fn run(
    state: &AppState,
    command: CardCommand,
    body: Result<Json<UserCardRequest>, JsonRejection>,
) -> Result<Json<OutcomeResponse>, ServerError> {
    let Json(body) = body?;
    let card = UserCard::from(body);
    let outcome = coordinator::apply(&state.store, command, &card, observation_time(Utc::now())).await?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    post,
    path = "/user_card/create",
    tag = "user_card",
    request_body = UserCardRequest,
    responses(
        (status = 200, description = "User, mapsets and beatmaps stored", body = OutcomeResponse),
        (status = 400, description = "Malformed body"),
        (status = 409, description = "User or one of its mapsets already exists"),
    )
)]
pub async fn create_user_card(
    State(state): State<Arc<AppState>>,
    body: Result<Json<UserCardRequest>, JsonRejection>,
) -> Result<Json<OutcomeResponse>, ServerError> {
    run(&state, CardCommand::Create, body).await
}

#[utoipa::path(
    post,
    path = "/user_card/update",
    tag = "user_card",
    request_body = UserCardRequest,
    responses(
        (status = 200, description = "New observation appended", body = OutcomeResponse),
        (status = 400, description = "Malformed body"),
        (status = 404, description = "User not stored"),
    )
)]
pub async fn update_user_card(
    State(state): State<Arc<AppState>>,
    body: Result<Json<UserCardRequest>, JsonRejection>,
) -> Result<Json<OutcomeResponse>, ServerError> {
    run(&state, CardCommand::Update, body).await
}

#[utoipa::path(
    get,
    path = "/user_card/{id}",
    tag = "user_card",
    params(("id" = i64, Path, description = "osu! user ID")),
    responses(
        (status = 200, description = "User with mapsets and beatmaps", body = UserCardResponse),
        (status = 404, description = "User not stored"),
    )
)]
pub async fn get_user_card(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<UserCardResponse>, ServerError> {
    let Path(id) = id?;
    let mut uow = state.store.read_only().await?;
    let user: User = uow.get(id).await?;

    let mut mapsets = Vec::new();
    for mapset in uow.list_mapsets_for_user(id).await? {
        let beatmaps = uow.list_beatmaps_for_mapset(mapset.id).await?;
        mapsets.push(MapsetResponse::with_beatmaps(mapset, beatmaps)?);
    }

    Ok(Json(UserCardResponse {
        user: user.try_into()?,
        mapsets,
    }))
}
