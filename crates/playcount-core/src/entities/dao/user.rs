use chrono::{DateTime, Utc};

/// A row in the `users` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub avatar_url: String,
    pub graveyard_beatmapset_count: i64,
    pub unranked_beatmapset_count: i64,
    /// History of `play_count`, `favourite_count` and `map_count` summed over
    /// the user's mapsets.
    pub user_stats: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
