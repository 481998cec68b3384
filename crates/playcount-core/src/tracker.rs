//! Polling passes over the followed users.
//!
//! A pass reads the follow list, then fetches and reconciles one user at a
//! time. Each user is committed on its own; the first failure stops the pass
//! and the users already committed stay committed. A [`TrackRun`] marker is
//! written only after every user went through.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::card::UserCard;
use crate::coordinator::{self, CardCommand, CardOutcome};
use crate::entities::{Following, Store, TrackRun};
use crate::error::{CoreError, FetchError, Result};
use crate::stats;

/// Source of fresh user cards.
pub trait UserFetcher: Send + Sync + 'static {
    fn user_with_mapsets(
        &self,
        user_id: i64,
    ) -> impl Future<Output = std::result::Result<UserCard, FetchError>> + Send;
}

/// Summary of one completed pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackReport {
    pub accounts: usize,
    pub outcome: CardOutcome,
    pub finished_at: DateTime<Utc>,
}

pub struct Tracker<F> {
    store: Store,
    fetcher: F,
    pace: Duration,
    running: Mutex<()>,
}

impl<F: UserFetcher> Tracker<F> {
    /// `pace` is slept between two consecutive fetches.
    pub fn new(store: Store, fetcher: F, pace: Duration) -> Self {
        Self {
            store,
            fetcher,
            pace,
            running: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Run one pass over every followed user.
    ///
    /// Fails with [`CoreError::TrackInProgress`] while another pass runs and
    /// with [`CoreError::EmptyFollowList`] when nobody is followed.
    #[instrument(skip(self))]
    pub async fn track(&self) -> Result<TrackReport> {
        let _pass = self
            .running
            .try_lock()
            .map_err(|_| CoreError::TrackInProgress)?;

        let follows = self.follow_list().await?;
        if follows.is_empty() {
            warn!("tracking pass skipped: follow list is empty");
            return Err(CoreError::EmptyFollowList);
        }
        info!(accounts = follows.len(), "tracking pass started");

        let mut outcome = CardOutcome::default();
        for (idx, follow) in follows.iter().enumerate() {
            if idx > 0 && !self.pace.is_zero() {
                tokio::time::sleep(self.pace).await;
            }
            outcome += self.track_one(follow).await?;
        }

        let run = self.record_run(Utc::now()).await?;
        info!(
            accounts = follows.len(),
            users_created = outcome.users.created,
            mapsets_created = outcome.mapsets.created,
            mapsets_updated = outcome.mapsets.updated,
            beatmaps_created = outcome.beatmaps.created,
            beatmaps_updated = outcome.beatmaps.updated,
            "tracking pass finished"
        );
        Ok(TrackReport {
            accounts: follows.len(),
            outcome,
            finished_at: run.tracked_at,
        })
    }

    async fn follow_list(&self) -> Result<Vec<Following>> {
        let mut uow = self.store.read_only().await?;
        let follows = uow.list_following().await?;
        uow.commit().await?;
        Ok(follows)
    }

    async fn track_one(&self, follow: &Following) -> Result<CardOutcome> {
        let card = self
            .fetcher
            .user_with_mapsets(follow.id)
            .await
            .map_err(|source| {
                warn!(user_id = follow.id, error = %source, "fetch failed, aborting pass");
                CoreError::ExternalFetch {
                    user_id: follow.id,
                    source,
                }
            })?;

        let observed_at = stats::observation_time(Utc::now());
        coordinator::apply(&self.store, CardCommand::Sync, &card, observed_at)
            .await
            .map_err(|source| {
                warn!(user_id = follow.id, error = %source, "store failed, aborting pass");
                CoreError::Track {
                    user_id: follow.id,
                    source: Box::new(source),
                }
            })
    }

    /// Write a completion marker in its own unit of work.
    pub async fn record_run(&self, tracked_at: DateTime<Utc>) -> Result<TrackRun> {
        let mut uow = self.store.read_write().await?;
        let run = uow.create_track_run(stats::observation_time(tracked_at)).await?;
        uow.commit().await?;
        Ok(run)
    }

    /// When the last pass completed, if ever.
    pub async fn last_tracked(&self) -> Result<Option<DateTime<Utc>>> {
        let mut uow = self.store.read_only().await?;
        let run = uow.last_track_run().await?;
        uow.commit().await?;
        Ok(run.map(|r| r.tracked_at))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex as StdMutex;
    use std::time::Instant;

    use tracing_test::traced_test;

    use super::*;
    use crate::card::tests::{card, mapset_snapshot};
    use crate::entities::tests::{at, memory_store};
    use crate::entities::{EntityKind, User};

    #[derive(Default)]
    struct FakeFetcher {
        failing: HashSet<i64>,
        calls: StdMutex<Vec<i64>>,
        called_at: StdMutex<Vec<Instant>>,
    }

    impl FakeFetcher {
        fn failing_on(ids: &[i64]) -> Self {
            Self {
                failing: ids.iter().copied().collect(),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<i64> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl UserFetcher for FakeFetcher {
        async fn user_with_mapsets(&self, user_id: i64) -> std::result::Result<UserCard, FetchError> {
            self.calls.lock().unwrap().push(user_id);
            self.called_at.lock().unwrap().push(Instant::now());
            if self.failing.contains(&user_id) {
                return Err(format!("upstream returned 500 for {user_id}").into());
            }
            Ok(card(user_id, vec![mapset_snapshot(user_id * 100, user_id, 10, vec![])]))
        }
    }

    async fn follow(store: &Store, ids: &[i64]) {
        let mut uow = store.read_write().await.unwrap();
        for (n, id) in ids.iter().enumerate() {
            uow.create_following(&Following {
                id: *id,
                username: format!("user{id}"),
                created_at: at(2024, 1, 1 + n as u32),
            })
            .await
            .unwrap();
        }
        uow.commit().await.unwrap();
    }

    #[tokio::test]
    async fn pass_tracks_every_follow_and_records_run() {
        let store = memory_store().await;
        follow(&store, &[1, 2, 3]).await;
        let tracker = Tracker::new(store.clone(), FakeFetcher::default(), Duration::ZERO);

        assert_eq!(tracker.last_tracked().await.unwrap(), None);
        let report = tracker.track().await.unwrap();
        assert_eq!(report.accounts, 3);
        assert_eq!(report.outcome.users.created, 3);
        assert_eq!(report.outcome.mapsets.created, 3);
        assert_eq!(tracker.last_tracked().await.unwrap(), Some(report.finished_at));

        let report = tracker.track().await.unwrap();
        assert_eq!(report.outcome.users.updated, 3);
        assert_eq!(tracker.fetcher.calls(), [1, 2, 3, 1, 2, 3]);
    }

    #[tokio::test]
    async fn empty_follow_list_fetches_nothing() {
        let store = memory_store().await;
        let tracker = Tracker::new(store, FakeFetcher::default(), Duration::ZERO);

        let err = tracker.track().await.unwrap_err();
        assert!(matches!(err, CoreError::EmptyFollowList));
        assert!(tracker.fetcher.calls().is_empty());
        assert_eq!(tracker.last_tracked().await.unwrap(), None);
    }

    #[tokio::test]
    #[traced_test]
    async fn fetch_failure_stops_the_pass() {
        let store = memory_store().await;
        follow(&store, &[1, 2, 3, 4, 5]).await;
        let tracker = Tracker::new(store.clone(), FakeFetcher::failing_on(&[2]), Duration::ZERO);

        let err = tracker.track().await.unwrap_err();
        assert!(matches!(err, CoreError::ExternalFetch { user_id: 2, .. }));
        assert_eq!(tracker.fetcher.calls(), [1, 2]);
        assert!(logs_contain("fetch failed, aborting pass"));

        let mut uow = store.read_only().await.unwrap();
        assert!(uow.exists::<User>(1).await.unwrap());
        for id in 2..=5 {
            assert!(!uow.exists::<User>(id).await.unwrap());
        }
        assert!(uow.last_track_run().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn store_failure_is_wrapped_with_the_user() {
        let store = memory_store().await;
        follow(&store, &[1, 2]).await;
        // User 2 is stored with a history that cannot be merged into.
        let mut uow = store.read_write().await.unwrap();
        coordinator::create_card(&mut uow, &card(2, vec![]), at(2024, 1, 1)).await.unwrap();
        sqlx::query("UPDATE users SET user_stats = '[1, 2]' WHERE id = 2")
            .execute(uow.conn())
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let tracker = Tracker::new(store.clone(), FakeFetcher::default(), Duration::ZERO);
        let err = tracker.track().await.unwrap_err();
        assert!(matches!(err, CoreError::Track { user_id: 2, .. }));
        assert!(matches!(
            err.root(),
            CoreError::MalformedHistory { kind: EntityKind::User, id: 2, .. }
        ));

        let mut uow = store.read_only().await.unwrap();
        assert!(uow.exists::<User>(1).await.unwrap());
        assert!(uow.last_track_run().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn pace_separates_fetches_but_not_the_first() {
        let pace = Duration::from_millis(300);
        let store = memory_store().await;
        follow(&store, &[1, 2, 3]).await;
        let tracker = Tracker::new(store, FakeFetcher::default(), pace);

        let started = Instant::now();
        tracker.track().await.unwrap();

        let called_at = tracker.fetcher.called_at.lock().unwrap().clone();
        assert_eq!(called_at.len(), 3);
        assert!(called_at[0] - started < pace, "first fetch was delayed");
        for pair in called_at.windows(2) {
            assert!(pair[1] - pair[0] >= pace, "fetches closer than the pace");
        }
    }

    #[tokio::test]
    async fn concurrent_pass_is_rejected() {
        let store = memory_store().await;
        follow(&store, &[1]).await;
        let tracker = Tracker::new(store, FakeFetcher::default(), Duration::ZERO);

        let _held = tracker.running.lock().await;
        assert!(matches!(tracker.track().await.unwrap_err(), CoreError::TrackInProgress));
    }
}
