//! Observed state of one user as delivered by the API or an HTTP command.
//!
//! A [`UserCard`] is the unit the coordinator reconciles: the user, every
//! mapset they own, and every difficulty of those mapsets. Each snapshot
//! type knows how to become a stored record and which counters it
//! contributes to that record's statistics history.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::entities::{Beatmap, Mapset, RankStatus, User};
use crate::stats::Snapshot;

pub const PLAY_COUNT: &str = "play_count";
pub const FAVOURITE_COUNT: &str = "favourite_count";
pub const PASS_COUNT: &str = "pass_count";
pub const MAP_COUNT: &str = "map_count";

#[derive(Debug, Clone, PartialEq)]
pub struct UserCard {
    pub user: UserSnapshot,
    pub mapsets: Vec<MapsetSnapshot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserSnapshot {
    pub id: i64,
    pub username: String,
    pub avatar_url: String,
    pub unranked_beatmapset_count: i64,
    pub graveyard_beatmapset_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapsetSnapshot {
    pub id: i64,
    pub artist: String,
    pub title: String,
    pub covers: BTreeMap<String, String>,
    pub status: RankStatus,
    pub last_updated: DateTime<Utc>,
    pub user_id: i64,
    pub preview_url: String,
    pub tags: String,
    pub play_count: i64,
    pub favourite_count: i64,
    pub bpm: f64,
    pub creator: String,
    pub beatmaps: Vec<BeatmapSnapshot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BeatmapSnapshot {
    pub id: i64,
    pub beatmapset_id: i64,
    pub difficulty_rating: f64,
    pub version: String,
    pub accuracy: f64,
    pub ar: f64,
    pub bpm: f64,
    pub cs: f64,
    pub status: RankStatus,
    pub url: String,
    pub total_length: i64,
    pub user_id: i64,
    pub pass_count: i64,
    pub play_count: i64,
    pub last_updated: DateTime<Utc>,
}

impl UserCard {
    /// The user's counters are totals over the mapsets on the card.
    pub fn user_stats(&self) -> Snapshot {
        let (plays, favourites) = self.mapsets.iter().fold((0, 0), |(p, f), ms| {
            (p + ms.play_count, f + ms.favourite_count)
        });
        Snapshot::new()
            .with(PLAY_COUNT, plays)
            .with(FAVOURITE_COUNT, favourites)
            .with(MAP_COUNT, self.mapsets.len() as i64)
    }

    pub fn beatmap_count(&self) -> usize {
        self.mapsets.iter().map(|ms| ms.beatmaps.len()).sum()
    }
}

impl UserSnapshot {
    /// A fresh record with an empty history, stamped `observed_at`.
    pub fn to_record(&self, observed_at: DateTime<Utc>) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
            avatar_url: self.avatar_url.clone(),
            graveyard_beatmapset_count: self.graveyard_beatmapset_count,
            unranked_beatmapset_count: self.unranked_beatmapset_count,
            user_stats: String::new(),
            created_at: observed_at,
            updated_at: observed_at,
        }
    }
}

impl MapsetSnapshot {
    /// A fresh record owned by `owner_id`, with an empty history.
    pub fn to_record(&self, owner_id: i64, observed_at: DateTime<Utc>) -> Mapset {
        Mapset {
            id: self.id,
            user_id: owner_id,
            artist: self.artist.clone(),
            title: self.title.clone(),
            covers: self.covers.clone(),
            status: self.status,
            last_updated: self.last_updated,
            creator: self.creator.clone(),
            preview_url: self.preview_url.clone(),
            tags: self.tags.clone(),
            bpm: self.bpm,
            mapset_stats: String::new(),
            created_at: observed_at,
            updated_at: observed_at,
        }
    }

    pub fn stats(&self) -> Snapshot {
        Snapshot::new()
            .with(PLAY_COUNT, self.play_count)
            .with(FAVOURITE_COUNT, self.favourite_count)
    }
}

impl BeatmapSnapshot {
    /// A fresh record attached to `mapset_id`, with an empty history.
    pub fn to_record(&self, mapset_id: i64, observed_at: DateTime<Utc>) -> Beatmap {
        Beatmap {
            id: self.id,
            mapset_id,
            difficulty_rating: self.difficulty_rating,
            version: self.version.clone(),
            accuracy: self.accuracy,
            ar: self.ar,
            bpm: self.bpm,
            cs: self.cs,
            status: self.status,
            url: self.url.clone(),
            total_length: self.total_length,
            user_id: self.user_id,
            last_updated: self.last_updated,
            beatmap_stats: String::new(),
            created_at: observed_at,
            updated_at: observed_at,
        }
    }

    pub fn stats(&self) -> Snapshot {
        Snapshot::new()
            .with(PLAY_COUNT, self.play_count)
            .with(PASS_COUNT, self.pass_count)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
