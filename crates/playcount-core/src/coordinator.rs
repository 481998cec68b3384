//! Reconciliation of a [`UserCard`] with the stored rows.
//!
//! Every entity on the card is routed through the resolver. New rows get a
//! history with a single observation; existing rows keep their creation
//! timestamp and get the new observation appended to their history. All of
//! it runs on the caller's unit of work, so one card is one transaction.

use std::ops::AddAssign;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::card::{MapsetSnapshot, UserCard};
use crate::entities::{EntityKind, Mapset, Record, Store, UnitOfWork, User};
use crate::error::{CoreError, Result};
use crate::resolver::{resolve, Resolution};
use crate::stats::{self, Snapshot, StatsHistory};

/// How a reconciled card should treat its user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardCommand {
    /// The user must not exist yet.
    Create,
    /// The user must already exist.
    Update,
    /// Whichever of the two applies (polling).
    Sync,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub created: usize,
    pub updated: usize,
}

impl Tally {
    fn record(&mut self, step: Step) {
        match step {
            Step::Created => self.created += 1,
            Step::Updated => self.updated += 1,
        }
    }
}

/// Rows written while reconciling one or more cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CardOutcome {
    pub users: Tally,
    pub mapsets: Tally,
    pub beatmaps: Tally,
}

impl AddAssign for CardOutcome {
    fn add_assign(&mut self, other: Self) {
        for (mine, theirs) in [
            (&mut self.users, other.users),
            (&mut self.mapsets, other.mapsets),
            (&mut self.beatmaps, other.beatmaps),
        ] {
            mine.created += theirs.created;
            mine.updated += theirs.updated;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Created,
    Updated,
}

// ── Record preparation ────────────────────────────────────────────────────────

/// A new record whose history holds exactly this observation.
fn fresh<R: Record>(mut record: R, observed_at: DateTime<Utc>, snapshot: Snapshot) -> Result<R> {
    let history = StatsHistory::first(observed_at, snapshot)
        .to_json()
        .map_err(|e| CoreError::history(R::KIND, record.id(), e))?;
    record.set_stats(history);
    record.set_timestamps(observed_at, observed_at);
    Ok(record)
}

/// `incoming` carrying the stored history plus this observation, and the
/// stored creation timestamp.
fn merge<R: Record>(
    existing: &R,
    mut incoming: R,
    observed_at: DateTime<Utc>,
    snapshot: Snapshot,
) -> Result<R> {
    let history = stats::append(existing.stats(), observed_at, snapshot)
        .and_then(|h| h.to_json())
        .map_err(|e| CoreError::history(R::KIND, existing.id(), e))?;
    incoming.set_stats(history);
    incoming.set_timestamps(existing.created_at(), observed_at);
    Ok(incoming)
}

async fn upsert<R: Record>(
    uow: &mut UnitOfWork<'_>,
    incoming: R,
    observed_at: DateTime<Utc>,
    snapshot: Snapshot,
) -> Result<Step> {
    match resolve(uow, incoming).await? {
        Resolution::Create(record) => {
            let record = fresh(record, observed_at, snapshot)?;
            uow.create(&record).await?;
            debug!(kind = %R::KIND, id = record.id(), "created");
            Ok(Step::Created)
        }
        Resolution::Update { existing, incoming } => {
            let record = merge(&existing, incoming, observed_at, snapshot)?;
            uow.update(&record).await?;
            debug!(kind = %R::KIND, id = record.id(), "updated");
            Ok(Step::Updated)
        }
    }
}

// ── Mapsets ───────────────────────────────────────────────────────────────────

/// Create a mapset. Its beatmaps are routed one by one, so a difficulty
/// listed twice is updated rather than created again.
async fn insert_mapset(
    uow: &mut UnitOfWork<'_>,
    snapshot: &MapsetSnapshot,
    owner_id: i64,
    observed_at: DateTime<Utc>,
    outcome: &mut CardOutcome,
) -> Result<()> {
    let mapset = fresh(snapshot.to_record(owner_id, observed_at), observed_at, snapshot.stats())?;
    uow.create(&mapset).await?;
    outcome.mapsets.record(Step::Created);

    for beatmap in &snapshot.beatmaps {
        let step = upsert(uow, beatmap.to_record(mapset.id, observed_at), observed_at, beatmap.stats()).await?;
        outcome.beatmaps.record(step);
    }
    Ok(())
}

/// Create-or-update a mapset; beatmaps of an existing mapset are each
/// routed on their own.
async fn upsert_mapset(
    uow: &mut UnitOfWork<'_>,
    snapshot: &MapsetSnapshot,
    owner_id: i64,
    observed_at: DateTime<Utc>,
    outcome: &mut CardOutcome,
) -> Result<()> {
    let incoming = snapshot.to_record(owner_id, observed_at);
    let existing = match resolve(uow, incoming).await? {
        Resolution::Create(_) => {
            return insert_mapset(uow, snapshot, owner_id, observed_at, outcome).await;
        }
        Resolution::Update { existing, incoming } => {
            let record = merge(&existing, incoming, observed_at, snapshot.stats())?;
            uow.update(&record).await?;
            outcome.mapsets.record(Step::Updated);
            record
        }
    };

    for beatmap in &snapshot.beatmaps {
        let step = upsert(uow, beatmap.to_record(existing.id, observed_at), observed_at, beatmap.stats()).await?;
        outcome.beatmaps.record(step);
    }
    Ok(())
}

// ── Cards ─────────────────────────────────────────────────────────────────────

/// Store a user seen for the first time, with all of their mapsets.
///
/// Fails with [`CoreError::AlreadyExists`] when the user is already stored.
pub async fn create_card(
    uow: &mut UnitOfWork<'_>,
    card: &UserCard,
    observed_at: DateTime<Utc>,
) -> Result<CardOutcome> {
    let user_id = card.user.id;
    if uow.exists::<User>(user_id).await? {
        return Err(CoreError::AlreadyExists { kind: EntityKind::User, id: user_id });
    }

    let mut outcome = CardOutcome::default();
    let user = fresh(card.user.to_record(observed_at), observed_at, card.user_stats())?;
    uow.create(&user).await?;
    outcome.users.record(Step::Created);

    // Same routing as an update: a card may list one mapset more than once.
    for mapset in &card.mapsets {
        upsert_mapset(uow, mapset, user_id, observed_at, &mut outcome).await?;
    }
    Ok(outcome)
}

/// Append a new observation for a stored user and reconcile their mapsets.
///
/// Fails with [`CoreError::NotFound`] when the user is not stored. Mapsets
/// and beatmaps missing from the card are left as they are.
pub async fn update_card(
    uow: &mut UnitOfWork<'_>,
    card: &UserCard,
    observed_at: DateTime<Utc>,
) -> Result<CardOutcome> {
    let user_id = card.user.id;
    let existing: User = uow.get(user_id).await?;

    let mut outcome = CardOutcome::default();
    let user = merge(&existing, card.user.to_record(observed_at), observed_at, card.user_stats())?;
    uow.update(&user).await?;
    outcome.users.record(Step::Updated);

    for mapset in &card.mapsets {
        upsert_mapset(uow, mapset, user_id, observed_at, &mut outcome).await?;
    }
    Ok(outcome)
}

/// Create or update, depending on whether the user is stored.
pub async fn sync_card(
    uow: &mut UnitOfWork<'_>,
    card: &UserCard,
    observed_at: DateTime<Utc>,
) -> Result<CardOutcome> {
    if uow.exists::<User>(card.user.id).await? {
        update_card(uow, card, observed_at).await
    } else {
        create_card(uow, card, observed_at).await
    }
}

/// Store a single new mapset, owned by `snapshot.user_id`.
pub async fn create_mapset(
    uow: &mut UnitOfWork<'_>,
    snapshot: &MapsetSnapshot,
    observed_at: DateTime<Utc>,
) -> Result<CardOutcome> {
    if uow.exists::<Mapset>(snapshot.id).await? {
        return Err(CoreError::AlreadyExists { kind: EntityKind::Mapset, id: snapshot.id });
    }
    if !uow.exists::<User>(snapshot.user_id).await? {
        return Err(CoreError::NotFound { kind: EntityKind::User, id: snapshot.user_id });
    }

    let mut outcome = CardOutcome::default();
    insert_mapset(uow, snapshot, snapshot.user_id, observed_at, &mut outcome).await?;
    Ok(outcome)
}

/// Run `command` for `card` in its own read-write unit of work and commit.
///
/// Any error leaves the store exactly as it was.
pub async fn apply(
    store: &Store,
    command: CardCommand,
    card: &UserCard,
    observed_at: DateTime<Utc>,
) -> Result<CardOutcome> {
    let mut uow = store.read_write().await?;
    let outcome = match command {
        CardCommand::Create => create_card(&mut uow, card, observed_at).await?,
        CardCommand::Update => update_card(&mut uow, card, observed_at).await?,
        CardCommand::Sync => sync_card(&mut uow, card, observed_at).await?,
    };
    uow.commit().await?;

    info!(
        user_id = card.user.id,
        ?command,
        mapsets_created = outcome.mapsets.created,
        mapsets_updated = outcome.mapsets.updated,
        beatmaps_created = outcome.beatmaps.created,
        beatmaps_updated = outcome.beatmaps.updated,
        "user card stored"
    );
    Ok(outcome)
}

/// [`create_mapset`] in its own committed unit of work.
pub async fn apply_mapset(
    store: &Store,
    snapshot: &MapsetSnapshot,
    observed_at: DateTime<Utc>,
) -> Result<CardOutcome> {
    let mut uow = store.read_write().await?;
    let outcome = create_mapset(&mut uow, snapshot, observed_at).await?;
    uow.commit().await?;
    info!(mapset_id = snapshot.id, user_id = snapshot.user_id, "mapset stored");
    Ok(outcome)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::tests::{beatmap_snapshot, card, mapset_snapshot};
    use crate::card::{FAVOURITE_COUNT, MAP_COUNT, PLAY_COUNT};
    use crate::entities::mapset::tests::mapset;
    use crate::entities::tests::{at, memory_store, user};
    use crate::entities::Beatmap;

    fn history<R: Record>(record: &R) -> StatsHistory {
        StatsHistory::parse(record.stats()).unwrap()
    }

    #[tokio::test]
    async fn create_card_writes_first_observation_everywhere() {
        let store = memory_store().await;
        let now = at(2024, 1, 1);
        let card = card(
            1,
            vec![
                mapset_snapshot(10, 1, 40, vec![beatmap_snapshot(100, 10, 30), beatmap_snapshot(101, 10, 10)]),
                mapset_snapshot(11, 1, 20, vec![]),
            ],
        );

        let outcome = apply(&store, CardCommand::Create, &card, now).await.unwrap();
        assert_eq!(outcome.users, Tally { created: 1, updated: 0 });
        assert_eq!(outcome.mapsets, Tally { created: 2, updated: 0 });
        assert_eq!(outcome.beatmaps, Tally { created: 2, updated: 0 });

        let mut uow = store.read_only().await.unwrap();
        let stored: User = uow.get(1).await.unwrap();
        assert_eq!(stored.created_at, now);
        let snap = history(&stored).get(&now).cloned().unwrap();
        assert_eq!(snap.get(PLAY_COUNT), Some(60));
        assert_eq!(snap.get(FAVOURITE_COUNT), Some(6));
        assert_eq!(snap.get(MAP_COUNT), Some(2));

        let beatmap: Beatmap = uow.get(101).await.unwrap();
        assert_eq!(beatmap.mapset_id, 10);
        assert_eq!(history(&beatmap).len(), 1);
    }

    #[tokio::test]
    async fn create_card_for_stored_user_is_rejected() {
        let store = memory_store().await;
        let card = card(1, vec![mapset_snapshot(10, 1, 40, vec![])]);
        apply(&store, CardCommand::Create, &card, at(2024, 1, 1)).await.unwrap();

        let err = apply(&store, CardCommand::Create, &card, at(2024, 1, 2)).await.unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists { kind: EntityKind::User, id: 1 }));

        let mut uow = store.read_only().await.unwrap();
        let stored: User = uow.get(1).await.unwrap();
        assert_eq!(history(&stored).len(), 1);
    }

    #[tokio::test]
    async fn update_card_for_unknown_user_is_not_found() {
        let store = memory_store().await;
        let err = apply(&store, CardCommand::Update, &card(9, vec![]), at(2024, 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { kind: EntityKind::User, id: 9 }));
    }

    #[tokio::test]
    async fn update_appends_and_creates_unseen_mapsets() {
        let store = memory_store().await;
        let first = at(2023, 12, 24) + chrono::Duration::hours(12);
        let second = at(2024, 1, 1);

        let mut uow = store.read_write().await.unwrap();
        uow.create(&user(123, "owner")).await.unwrap();
        let mut seen = mapset(123, 123);
        seen.mapset_stats = r#"{"2023-12-24T12:00:00Z":{"play_count":52}}"#.to_owned();
        uow.create(&seen).await.unwrap();
        uow.commit().await.unwrap();

        let card = card(
            123,
            vec![mapset_snapshot(123, 123, 60, vec![]), mapset_snapshot(345, 123, 5, vec![])],
        );
        let outcome = apply(&store, CardCommand::Update, &card, second).await.unwrap();
        assert_eq!(outcome.mapsets, Tally { created: 1, updated: 1 });

        let mut uow = store.read_only().await.unwrap();
        let updated: Mapset = uow.get(123).await.unwrap();
        let h = history(&updated);
        assert_eq!(h.len(), 2);
        assert_eq!(h.get(&first).and_then(|s| s.get(PLAY_COUNT)), Some(52));
        assert_eq!(h.get(&second).and_then(|s| s.get(PLAY_COUNT)), Some(60));
        assert_eq!(updated.created_at, seen.created_at);
        assert_eq!(updated.updated_at, second);

        let created: Mapset = uow.get(345).await.unwrap();
        assert_eq!(history(&created).len(), 1);
        assert_eq!(created.created_at, second);

        let owner: User = uow.get(123).await.unwrap();
        assert_eq!(owner.created_at, at(2023, 12, 24));
    }

    #[tokio::test]
    async fn beatmaps_of_existing_mapset_are_upserted() {
        let store = memory_store().await;
        let initial = card(1, vec![mapset_snapshot(10, 1, 40, vec![beatmap_snapshot(100, 10, 30)])]);
        apply(&store, CardCommand::Create, &initial, at(2024, 1, 1)).await.unwrap();

        let next = card(
            1,
            vec![mapset_snapshot(10, 1, 45, vec![beatmap_snapshot(100, 10, 35), beatmap_snapshot(101, 10, 1)])],
        );
        let outcome = apply(&store, CardCommand::Sync, &next, at(2024, 1, 2)).await.unwrap();
        assert_eq!(outcome.users, Tally { created: 0, updated: 1 });
        assert_eq!(outcome.beatmaps, Tally { created: 1, updated: 1 });

        let mut uow = store.read_only().await.unwrap();
        let old: Beatmap = uow.get(100).await.unwrap();
        assert_eq!(history(&old).len(), 2);
        assert_eq!(old.created_at, at(2024, 1, 1));
        let new: Beatmap = uow.get(101).await.unwrap();
        assert_eq!(history(&new).len(), 1);
    }

    #[tokio::test]
    async fn stale_mapsets_are_retained() {
        let store = memory_store().await;
        let initial = card(1, vec![mapset_snapshot(10, 1, 40, vec![]), mapset_snapshot(11, 1, 4, vec![])]);
        apply(&store, CardCommand::Create, &initial, at(2024, 1, 1)).await.unwrap();

        let shrunk = card(1, vec![mapset_snapshot(10, 1, 41, vec![])]);
        apply(&store, CardCommand::Update, &shrunk, at(2024, 1, 2)).await.unwrap();

        let mut uow = store.read_only().await.unwrap();
        let kept: Mapset = uow.get(11).await.unwrap();
        assert_eq!(history(&kept).len(), 1);
    }

    #[tokio::test]
    async fn failing_beatmap_rolls_back_the_whole_card() {
        let store = memory_store().await;
        let initial = card(1, vec![mapset_snapshot(10, 1, 40, vec![beatmap_snapshot(100, 10, 30)])]);
        apply(&store, CardCommand::Create, &initial, at(2024, 1, 1)).await.unwrap();

        let mut uow = store.read_write().await.unwrap();
        sqlx::query("UPDATE beatmaps SET beatmap_stats = 'not json' WHERE id = 100")
            .execute(uow.conn())
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let next = card(
            1,
            vec![
                mapset_snapshot(99, 1, 1, vec![]),
                mapset_snapshot(10, 1, 50, vec![beatmap_snapshot(100, 10, 40)]),
            ],
        );
        let err = apply(&store, CardCommand::Update, &next, at(2024, 1, 2)).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::MalformedHistory { kind: EntityKind::Beatmap, id: 100, .. }
        ));

        let mut uow = store.read_only().await.unwrap();
        assert!(!uow.exists::<Mapset>(99).await.unwrap());
        let user: User = uow.get(1).await.unwrap();
        assert_eq!(history(&user).len(), 1);
        let mapset: Mapset = uow.get(10).await.unwrap();
        assert_eq!(history(&mapset).len(), 1);
    }

    #[tokio::test]
    async fn same_instant_keeps_the_first_observation() {
        let store = memory_store().await;
        let now = at(2024, 1, 1);
        apply(&store, CardCommand::Create, &card(1, vec![mapset_snapshot(10, 1, 40, vec![])]), now)
            .await
            .unwrap();
        apply(&store, CardCommand::Update, &card(1, vec![mapset_snapshot(10, 1, 99, vec![])]), now)
            .await
            .unwrap();

        let mut uow = store.read_only().await.unwrap();
        let mapset: Mapset = uow.get(10).await.unwrap();
        let h = history(&mapset);
        assert_eq!(h.len(), 1);
        assert_eq!(h.get(&now).and_then(|s| s.get(PLAY_COUNT)), Some(40));
    }

    #[tokio::test]
    async fn repeated_ids_on_a_new_card_match_a_stored_user() {
        let listed_twice = || {
            card(
                1,
                vec![
                    mapset_snapshot(10, 1, 40, vec![beatmap_snapshot(100, 10, 30), beatmap_snapshot(100, 10, 30)]),
                    mapset_snapshot(10, 1, 40, vec![]),
                ],
            )
        };

        let store = memory_store().await;
        let outcome = apply(&store, CardCommand::Sync, &listed_twice(), at(2024, 1, 1)).await.unwrap();
        assert_eq!(outcome.users, Tally { created: 1, updated: 0 });
        assert_eq!(outcome.mapsets, Tally { created: 1, updated: 1 });
        assert_eq!(outcome.beatmaps, Tally { created: 1, updated: 1 });

        let outcome = apply(&store, CardCommand::Sync, &listed_twice(), at(2024, 1, 2)).await.unwrap();
        assert_eq!(outcome.users, Tally { created: 0, updated: 1 });
        assert_eq!(outcome.mapsets, Tally { created: 0, updated: 2 });

        let mut uow = store.read_only().await.unwrap();
        let mapset: Mapset = uow.get(10).await.unwrap();
        assert_eq!(history(&mapset).len(), 2);
    }

    #[tokio::test]
    async fn create_mapset_checks_owner_and_duplicates() {
        let store = memory_store().await;
        let orphan = mapset_snapshot(10, 5, 1, vec![]);
        let err = apply_mapset(&store, &orphan, at(2024, 1, 1)).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { kind: EntityKind::User, id: 5 }));

        apply(&store, CardCommand::Create, &card(5, vec![]), at(2024, 1, 1)).await.unwrap();
        let outcome = apply_mapset(&store, &orphan, at(2024, 1, 1)).await.unwrap();
        assert_eq!(outcome.mapsets.created, 1);

        let err = apply_mapset(&store, &orphan, at(2024, 1, 2)).await.unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists { kind: EntityKind::Mapset, id: 10 }));
    }
}
