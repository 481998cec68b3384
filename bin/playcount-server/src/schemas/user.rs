use chrono::{DateTime, Utc};
use playcount_core::{CoreError, EntityKind, StatsHistory, User};
use serde::Serialize;
use utoipa::ToSchema;

use super::history;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub avatar_url: String,
    pub graveyard_beatmapset_count: i64,
    pub unranked_beatmapset_count: i64,
    /// Observation timestamp → counters (`play_count`, `favourite_count`, `map_count`).
    #[schema(value_type = Object)]
    pub user_stats: StatsHistory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<User> for UserResponse {
    type Error = CoreError;

    fn try_from(user: User) -> Result<Self, Self::Error> {
        Ok(Self {
            user_stats: history(EntityKind::User, user.id, &user.user_stats)?,
            id: user.id,
            username: user.username,
            avatar_url: user.avatar_url,
            graveyard_beatmapset_count: user.graveyard_beatmapset_count,
            unranked_beatmapset_count: user.unranked_beatmapset_count,
            created_at: user.created_at,
            updated_at: user.updated_at,
        })
    }
}
