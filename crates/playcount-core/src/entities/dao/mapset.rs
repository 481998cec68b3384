use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::entities::RankStatus;

/// A row in the `mapsets` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Mapset {
    pub id: i64,
    /// Owning user.
    pub user_id: i64,
    pub artist: String,
    pub title: String,
    /// Cover name → image URL.
    #[sqlx(json)]
    pub covers: BTreeMap<String, String>,
    pub status: RankStatus,
    pub last_updated: DateTime<Utc>,
    pub creator: String,
    pub preview_url: String,
    pub tags: String,
    pub bpm: f64,
    /// History of `play_count` and `favourite_count`.
    pub mapset_stats: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
