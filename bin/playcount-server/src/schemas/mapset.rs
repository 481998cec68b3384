use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use playcount_core::{Beatmap, CoreError, EntityKind, Mapset, RankStatus, StatsHistory};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::history;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 500;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BeatmapResponse {
    pub id: i64,
    pub mapset_id: i64,
    pub difficulty_rating: f64,
    pub version: String,
    pub accuracy: f64,
    pub ar: f64,
    pub bpm: f64,
    pub cs: f64,
    #[schema(value_type = String, example = "graveyard")]
    pub status: RankStatus,
    pub url: String,
    pub total_length: i64,
    pub user_id: i64,
    pub last_updated: DateTime<Utc>,
    /// Observation timestamp → counters (`play_count`, `pass_count`).
    #[schema(value_type = Object)]
    pub beatmap_stats: StatsHistory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<Beatmap> for BeatmapResponse {
    type Error = CoreError;

    fn try_from(b: Beatmap) -> Result<Self, Self::Error> {
        Ok(Self {
            beatmap_stats: history(EntityKind::Beatmap, b.id, &b.beatmap_stats)?,
            id: b.id,
            mapset_id: b.mapset_id,
            difficulty_rating: b.difficulty_rating,
            version: b.version,
            accuracy: b.accuracy,
            ar: b.ar,
            bpm: b.bpm,
            cs: b.cs,
            status: b.status,
            url: b.url,
            total_length: b.total_length,
            user_id: b.user_id,
            last_updated: b.last_updated,
            created_at: b.created_at,
            updated_at: b.updated_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MapsetResponse {
    pub id: i64,
    pub user_id: i64,
    pub artist: String,
    pub title: String,
    pub covers: BTreeMap<String, String>,
    #[schema(value_type = String, example = "graveyard")]
    pub status: RankStatus,
    pub last_updated: DateTime<Utc>,
    pub creator: String,
    pub preview_url: String,
    pub tags: String,
    pub bpm: f64,
    /// Observation timestamp → counters (`play_count`, `favourite_count`).
    #[schema(value_type = Object)]
    pub mapset_stats: StatsHistory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present on single-mapset and user-card responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beatmaps: Option<Vec<BeatmapResponse>>,
}

impl MapsetResponse {
    pub fn with_beatmaps(mapset: Mapset, beatmaps: Vec<Beatmap>) -> Result<Self, CoreError> {
        let mut response = Self::try_from(mapset)?;
        response.beatmaps = Some(
            beatmaps
                .into_iter()
                .map(BeatmapResponse::try_from)
                .collect::<Result<_, _>>()?,
        );
        Ok(response)
    }
}

impl TryFrom<Mapset> for MapsetResponse {
    type Error = CoreError;

    fn try_from(m: Mapset) -> Result<Self, Self::Error> {
        Ok(Self {
            mapset_stats: history(EntityKind::Mapset, m.id, &m.mapset_stats)?,
            id: m.id,
            user_id: m.user_id,
            artist: m.artist,
            title: m.title,
            covers: m.covers,
            status: m.status,
            last_updated: m.last_updated,
            creator: m.creator,
            preview_url: m.preview_url,
            tags: m.tags,
            bpm: m.bpm,
            created_at: m.created_at,
            updated_at: m.updated_at,
            beatmaps: None,
        })
    }
}

/// Query parameters for `GET /mapsets`.
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct MapsetPageQuery {
    /// 1-based page number.
    #[serde(default = "first_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn first_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MapsetPageResponse {
    pub items: Vec<MapsetResponse>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}
