use chrono::{DateTime, Utc};

use crate::entities::RankStatus;

/// A row in the `beatmaps` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Beatmap {
    pub id: i64,
    pub mapset_id: i64,
    pub difficulty_rating: f64,
    pub version: String,
    pub accuracy: f64,
    pub ar: f64,
    pub bpm: f64,
    pub cs: f64,
    pub status: RankStatus,
    pub url: String,
    /// Length in seconds.
    pub total_length: i64,
    /// Mapper of this difficulty; differs from the mapset owner for guest
    /// difficulties.
    pub user_id: i64,
    pub last_updated: DateTime<Utc>,
    /// History of `play_count` and `pass_count`.
    pub beatmap_stats: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
