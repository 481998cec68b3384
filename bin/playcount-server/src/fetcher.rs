//! osu! API adapter for the tracker.

use playcount_core::{
    BeatmapSnapshot, FetchError, MapsetSnapshot, RankStatus, UserCard, UserFetcher, UserSnapshot,
};
use playcount_osuapi::{Beatmap, Beatmapset, OsuClient, User};

/// [`UserFetcher`] backed by the live osu! API.
#[derive(Debug, Clone)]
pub struct OsuFetcher {
    client: OsuClient,
}

impl OsuFetcher {
    pub fn new(client: OsuClient) -> Self {
        Self { client }
    }
}

impl UserFetcher for OsuFetcher {
    async fn user_with_mapsets(&self, user_id: i64) -> Result<UserCard, FetchError> {
        let (user, mapsets) = self.client.user_with_mapsets(user_id).await?;
        to_card(user, mapsets)
    }
}

fn rank_status(raw: &str) -> Result<RankStatus, FetchError> {
    raw.parse()
        .map_err(|_| format!("unknown rank status '{raw}'").into())
}

pub(crate) fn to_card(user: User, mapsets: Vec<Beatmapset>) -> Result<UserCard, FetchError> {
    let unranked = user.unranked_count();
    Ok(UserCard {
        user: UserSnapshot {
            id: user.id,
            username: user.username,
            avatar_url: user.avatar_url,
            unranked_beatmapset_count: unranked,
            graveyard_beatmapset_count: user.graveyard_beatmapset_count,
        },
        mapsets: mapsets
            .into_iter()
            .map(to_mapset)
            .collect::<Result<_, _>>()?,
    })
}

fn to_mapset(set: Beatmapset) -> Result<MapsetSnapshot, FetchError> {
    Ok(MapsetSnapshot {
        id: set.id,
        status: rank_status(&set.status)?,
        artist: set.artist,
        title: set.title,
        covers: set.covers,
        last_updated: set.last_updated.unwrap_or_default(),
        user_id: set.user_id,
        preview_url: set.preview_url,
        tags: set.tags,
        play_count: set.play_count,
        favourite_count: set.favourite_count,
        bpm: set.bpm,
        creator: set.creator,
        beatmaps: set
            .beatmaps
            .into_iter()
            .map(to_beatmap)
            .collect::<Result<_, _>>()?,
    })
}

fn to_beatmap(map: Beatmap) -> Result<BeatmapSnapshot, FetchError> {
    Ok(BeatmapSnapshot {
        id: map.id,
        beatmapset_id: map.beatmapset_id,
        difficulty_rating: map.difficulty_rating,
        status: rank_status(&map.status)?,
        version: map.version,
        accuracy: map.accuracy,
        ar: map.ar,
        bpm: map.bpm,
        cs: map.cs,
        url: map.url,
        total_length: map.total_length,
        user_id: map.user_id,
        pass_count: map.passcount,
        play_count: map.playcount,
        last_updated: map.last_updated.unwrap_or_default(),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn api_mapset(status: &str) -> Beatmapset {
        serde_json::from_value(serde_json::json!({
            "id": 7, "artist": "a", "title": "t", "status": status,
            "last_updated": "2023-12-01T00:00:00Z", "user_id": 1,
            "play_count": 52, "favourite_count": 3,
            "beatmaps": [{
                "id": 70, "beatmapset_id": 7, "difficulty_rating": 5.3, "version": "Hard",
                "status": status, "user_id": 9, "passcount": 4, "playcount": 40,
                "last_updated": null
            }]
        }))
        .unwrap()
    }

    fn api_user() -> User {
        serde_json::from_value(serde_json::json!({
            "id": 1, "username": "mapper", "avatar_url": "https://a.ppy.sh/1",
            "graveyard_beatmapset_count": 1, "pending_beatmapset_count": 2
        }))
        .unwrap()
    }

    #[test]
    fn api_payload_becomes_card() {
        let card = to_card(api_user(), vec![api_mapset("graveyard")]).unwrap();
        assert_eq!(card.user.unranked_beatmapset_count, 2);
        let ms = &card.mapsets[0];
        assert_eq!(ms.status, RankStatus::Graveyard);
        assert_eq!(ms.beatmaps[0].pass_count, 4);
        assert_eq!(ms.beatmaps[0].play_count, 40);
        assert_eq!(ms.beatmaps[0].user_id, 9);
    }

    #[test]
    fn unknown_status_is_a_fetch_error() {
        let err = to_card(api_user(), vec![api_mapset("mystery")]).unwrap_err();
        assert!(err.to_string().contains("mystery"));
    }
}
