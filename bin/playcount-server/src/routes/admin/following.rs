//! Follow-list management.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use chrono::Utc;
use playcount_core::Following;
use playcount_core::stats::observation_time;
use tracing::info;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::admin::following::{FollowRequest, FollowingResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_following, follow, unfollow),
    components(schemas(FollowRequest, FollowingResponse))
)]
pub struct FollowingApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/following", get(list_following).post(follow))
        .route("/following/{id}", delete(unfollow))
}

#[utoipa::path(
    get,
    path = "/admin/following",
    tag = "admin",
    responses(
        (status = 200, description = "Followed users in the order they were added", body = Vec<FollowingResponse>),
        (status = 401, description = "Unauthorised (admin token required)"),
    )
)]
pub async fn list_following(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FollowingResponse>>, ServerError> {
    let mut uow = state.store.read_only().await?;
    let follows = uow.list_following().await?;
    Ok(Json(follows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/admin/following",
    tag = "admin",
    request_body = FollowRequest,
    responses(
        (status = 201, description = "User followed", body = FollowingResponse),
        (status = 401, description = "Unauthorised (admin token required)"),
        (status = 409, description = "Already followed"),
    )
)]
pub async fn follow(
    State(state): State<Arc<AppState>>,
    body: Result<Json<FollowRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<FollowingResponse>), ServerError> {
    let Json(body) = body?;
    if body.username.trim().is_empty() {
        return Err(ServerError::BadRequest("username must not be empty".into()));
    }

    let following = Following {
        id: body.id,
        username: body.username,
        created_at: observation_time(Utc::now()),
    };
    let mut uow = state.store.read_write().await?;
    uow.create_following(&following).await?;
    uow.commit().await?;

    info!(user_id = following.id, username = %following.username, "user followed");
    Ok((StatusCode::CREATED, Json(following.into())))
}

#[utoipa::path(
    delete,
    path = "/admin/following/{id}",
    tag = "admin",
    params(("id" = i64, Path, description = "osu! user ID")),
    responses(
        (status = 204, description = "User unfollowed; stored statistics are kept"),
        (status = 401, description = "Unauthorised (admin token required)"),
        (status = 404, description = "User was not followed"),
    )
)]
pub async fn unfollow(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ServerError> {
    let Path(id) = id?;
    let mut uow = state.store.read_write().await?;
    uow.delete_following(id).await?;
    uow.commit().await?;

    info!(user_id = id, "user unfollowed");
    Ok(StatusCode::NO_CONTENT)
}
