use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use playcount_core::{BeatmapSnapshot, MapsetSnapshot, RankStatus, UserCard, UserSnapshot};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::mapset::MapsetResponse;
use super::user::UserResponse;

/// Body of `POST /user_card/create` and `POST /user_card/update`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct UserCardRequest {
    pub user: UserCommand,
    #[serde(default)]
    pub mapsets: Vec<MapsetCommand>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct UserCommand {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "AvatarURL")]
    pub avatar_url: String,
    pub username: String,
    pub unranked_beatmapset_count: i64,
    pub graveyard_beatmapset_count: i64,
}

/// A mapset with its difficulties; also the body of `POST /mapsets/create`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct MapsetCommand {
    pub id: i64,
    pub artist: String,
    pub title: String,
    #[serde(default)]
    pub covers: BTreeMap<String, String>,
    #[schema(value_type = String, example = "graveyard")]
    pub status: RankStatus,
    pub last_updated: DateTime<Utc>,
    pub user_id: i64,
    #[serde(default)]
    pub preview_url: String,
    #[serde(default)]
    pub tags: String,
    pub play_count: i64,
    pub favourite_count: i64,
    pub bpm: f64,
    pub creator: String,
    #[serde(default)]
    pub beatmaps: Vec<BeatmapCommand>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct BeatmapCommand {
    pub id: i64,
    pub beatmapset_id: i64,
    pub difficulty_rating: f64,
    pub version: String,
    pub accuracy: f64,
    pub ar: f64,
    pub bpm: f64,
    pub cs: f64,
    #[schema(value_type = String, example = "graveyard")]
    pub status: RankStatus,
    #[serde(default)]
    pub url: String,
    pub total_length: i64,
    pub user_id: i64,
    pub passcount: i64,
    pub playcount: i64,
    pub last_updated: DateTime<Utc>,
}

impl From<UserCardRequest> for UserCard {
    fn from(req: UserCardRequest) -> Self {
        UserCard {
            user: UserSnapshot {
                id: req.user.id,
                username: req.user.username,
                avatar_url: req.user.avatar_url,
                unranked_beatmapset_count: req.user.unranked_beatmapset_count,
                graveyard_beatmapset_count: req.user.graveyard_beatmapset_count,
            },
            mapsets: req.mapsets.into_iter().map(MapsetSnapshot::from).collect(),
        }
    }
}

impl From<MapsetCommand> for MapsetSnapshot {
    fn from(m: MapsetCommand) -> Self {
        MapsetSnapshot {
            id: m.id,
            artist: m.artist,
            title: m.title,
            covers: m.covers,
            status: m.status,
            last_updated: m.last_updated,
            user_id: m.user_id,
            preview_url: m.preview_url,
            tags: m.tags,
            play_count: m.play_count,
            favourite_count: m.favourite_count,
            bpm: m.bpm,
            creator: m.creator,
            beatmaps: m.beatmaps.into_iter().map(BeatmapSnapshot::from).collect(),
        }
    }
}

impl From<BeatmapCommand> for BeatmapSnapshot {
    fn from(b: BeatmapCommand) -> Self {
        BeatmapSnapshot {
            id: b.id,
            beatmapset_id: b.beatmapset_id,
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
            pass_count: b.passcount,
            play_count: b.playcount,
            last_updated: b.last_updated,
        }
    }
}

/// A stored user with all of their mapsets and difficulties.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserCardResponse {
    pub user: UserResponse,
    pub mapsets: Vec<MapsetResponse>,
}
