use chrono::{DateTime, Utc};
use playcount_core::Following;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FollowRequest {
    /// osu! user ID.
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FollowingResponse {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<Following> for FollowingResponse {
    fn from(f: Following) -> Self {
        Self {
            id: f.id,
            username: f.username,
            created_at: f.created_at,
        }
    }
}
