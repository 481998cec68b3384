use utoipa::OpenApi;

use crate::routes::{admin, health, mapsets, track, user_card, users};

#[derive(OpenApi)]
#[openapi(info(
    title = "playcount-server",
    description = "osu! mapper statistics tracking API",
    version = "0.1.0",
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(users::UsersApi::openapi());
    root.merge(user_card::UserCardApi::openapi());
    root.merge(mapsets::MapsetsApi::openapi());
    root.merge(track::TrackApi::openapi());
    root.merge(admin::api_docs());
    root
}
