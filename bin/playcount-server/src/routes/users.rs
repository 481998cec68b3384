//! Stored users.

use std::sync::Arc;

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use playcount_core::User;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::mapset::MapsetResponse;
use crate::schemas::user::UserResponse;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_users, get_user, list_user_mapsets),
    components(schemas(UserResponse, MapsetResponse))
)]
pub struct UsersApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{key}", get(get_user))
        .route("/users/{key}/mapsets", get(list_user_mapsets))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    responses(
        (status = 200, description = "Every stored user, by username", body = Vec<UserResponse>),
    )
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, ServerError> {
    let mut uow = state.store.read_only().await?;
    let users = uow.list_users().await?;
    Ok(Json(
        users
            .into_iter()
            .map(UserResponse::try_from)
            .collect::<Result<_, _>>()?,
    ))
}

#[utoipa::path(
    get,
    path = "/users/{key}",
    tag = "users",
    params(("key" = String, Path, description = "Numeric osu! user ID or username")),
    responses(
        (status = 200, description = "The user", body = UserResponse),
        (status = 404, description = "No such user"),
    )
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<UserResponse>, ServerError> {
    let mut uow = state.store.read_only().await?;
    let user: User = match key.parse::<i64>() {
        Ok(id) => uow.get(id).await?,
        Err(_) => uow.user_by_name(&key).await?,
    };
    Ok(Json(user.try_into()?))
}

#[utoipa::path(
    get,
    path = "/users/{key}/mapsets",
    tag = "users",
    params(("key" = i64, Path, description = "osu! user ID")),
    responses(
        (status = 200, description = "Mapsets owned by the user", body = Vec<MapsetResponse>),
        (status = 400, description = "Non-numeric user ID"),
        (status = 404, description = "No such user"),
    )
)]
pub async fn list_user_mapsets(
    State(state): State<Arc<AppState>>,
    user_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<MapsetResponse>>, ServerError> {
    let Path(user_id) = user_id?;
    let mut uow = state.store.read_only().await?;
    uow.get::<User>(user_id).await?;
    let mapsets = uow.list_mapsets_for_user(user_id).await?;
    Ok(Json(
        mapsets
            .into_iter()
            .map(MapsetResponse::try_from)
            .collect::<Result<_, _>>()?,
    ))
}
