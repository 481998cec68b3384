//! osu! API v2 response shapes, limited to the fields the tracker stores.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub graveyard_beatmapset_count: i64,
    #[serde(default)]
    pub pending_beatmapset_count: i64,
    /// Older name of `pending_beatmapset_count`, still sent by some endpoints.
    #[serde(default)]
    pub unranked_beatmapset_count: Option<i64>,
}

impl User {
    pub fn unranked_count(&self) -> i64 {
        self.unranked_beatmapset_count
            .unwrap_or(self.pending_beatmapset_count)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beatmapset {
    pub id: i64,
    pub artist: String,
    pub title: String,
    #[serde(default)]
    pub covers: BTreeMap<String, String>,
    pub status: String,
    pub last_updated: Option<DateTime<Utc>>,
    pub user_id: i64,
    #[serde(default)]
    pub preview_url: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub play_count: i64,
    #[serde(default)]
    pub favourite_count: i64,
    #[serde(default)]
    pub bpm: f64,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub beatmaps: Vec<Beatmap>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beatmap {
    pub id: i64,
    pub beatmapset_id: i64,
    pub difficulty_rating: f64,
    pub version: String,
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default)]
    pub ar: f64,
    #[serde(default)]
    pub bpm: f64,
    #[serde(default)]
    pub cs: f64,
    pub status: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub total_length: i64,
    pub user_id: i64,
    #[serde(default)]
    pub passcount: i64,
    #[serde(default)]
    pub playcount: i64,
    pub last_updated: Option<DateTime<Utc>>,
}

/// The per-user mapset listings the API exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapsetKind {
    Ranked,
    Loved,
    Pending,
    Graveyard,
}

impl MapsetKind {
    pub const ALL: [MapsetKind; 4] = [
        MapsetKind::Ranked,
        MapsetKind::Loved,
        MapsetKind::Pending,
        MapsetKind::Graveyard,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MapsetKind::Ranked => "ranked",
            MapsetKind::Loved => "loved",
            MapsetKind::Pending => "pending",
            MapsetKind::Graveyard => "graveyard",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_api_beatmapset() {
        let raw = r#"{
            "id": 1, "artist": "a", "title": "t",
            "covers": {"cover": "https://assets.ppy.sh/1/cover.jpg"},
            "status": "graveyard", "last_updated": "2023-12-01T10:00:00+00:00",
            "user_id": 2, "preview_url": "//b.ppy.sh/preview/1.mp3", "tags": "x",
            "play_count": 52, "favourite_count": 3, "bpm": 150, "creator": "m",
            "nsfw": false,
            "beatmaps": [{
                "id": 10, "beatmapset_id": 1, "difficulty_rating": 5.3, "version": "Insane",
                "accuracy": 8, "ar": 9.3, "bpm": 150, "cs": 4, "status": "graveyard",
                "url": "https://osu.ppy.sh/beatmaps/10", "total_length": 120, "user_id": 2,
                "passcount": 7, "playcount": 40, "last_updated": "2023-12-01T10:00:00Z"
            }]
        }"#;
        let set: Beatmapset = serde_json::from_str(raw).unwrap();
        assert_eq!(set.play_count, 52);
        assert_eq!(set.covers.len(), 1);
        assert_eq!(set.beatmaps[0].passcount, 7);
        assert!(set.last_updated.is_some());
    }

    #[test]
    fn unranked_count_prefers_legacy_field() {
        let mut user: User =
            serde_json::from_str(r#"{"id": 1, "username": "u", "pending_beatmapset_count": 2}"#).unwrap();
        assert_eq!(user.unranked_count(), 2);
        user.unranked_beatmapset_count = Some(5);
        assert_eq!(user.unranked_count(), 5);
    }
}
