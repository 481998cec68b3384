//! Background task that starts a tracking pass once per interval.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use playcount_core::{CoreError, Tracker, UserFetcher};
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Time left until the next pass, given when the last one completed.
///
/// Restarts keep the remaining cooldown; an overdue or missing pass runs
/// immediately.
pub fn initial_delay(last: Option<DateTime<Utc>>, now: DateTime<Utc>, interval: Duration) -> Duration {
    match last {
        None => Duration::ZERO,
        Some(ts) => {
            let elapsed = (now - ts).to_std().unwrap_or(Duration::ZERO);
            interval.saturating_sub(elapsed)
        }
    }
}

/// Run passes every `interval` until `shutdown` flips to `true` or its
/// sender is dropped.
pub async fn run<F: UserFetcher>(
    tracker: Arc<Tracker<F>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let last = match tracker.last_tracked().await {
        Ok(last) => last,
        Err(e) => {
            warn!(error = %e, "could not read last track run; tracking now");
            None
        }
    };
    let mut delay = initial_delay(last, Utc::now(), interval);
    info!(interval_secs = interval.as_secs(), first_in_secs = delay.as_secs(), "scheduler started");

    loop {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        match tracker.track().await {
            Ok(report) => info!(
                accounts = report.accounts,
                finished_at = %report.finished_at,
                "scheduled tracking pass done"
            ),
            Err(CoreError::EmptyFollowList) => info!("nobody followed yet; skipping pass"),
            Err(CoreError::TrackInProgress) => info!("a pass is already running; skipping"),
            Err(e) => error!(error = %e, "scheduled tracking pass failed"),
        }
        delay = interval;
    }

    info!("scheduler stopped");
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;
    use playcount_core::{FetchError, Store, UserCard};

    use super::*;

    const DAY: Duration = Duration::from_secs(86_400);

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
    }

    #[test]
    fn first_pass_is_immediate_without_history() {
        assert_eq!(initial_delay(None, now(), DAY), Duration::ZERO);
    }

    #[test]
    fn restart_keeps_remaining_cooldown() {
        let last = now() - chrono::Duration::hours(1);
        assert_eq!(initial_delay(Some(last), now(), DAY), DAY - Duration::from_secs(3600));
    }

    #[test]
    fn overdue_pass_runs_now() {
        let last = now() - chrono::Duration::hours(30);
        assert_eq!(initial_delay(Some(last), now(), DAY), Duration::ZERO);
        // Clock skew: a marker from the future waits a full interval at most.
        let future = now() + chrono::Duration::hours(1);
        assert_eq!(initial_delay(Some(future), now(), DAY), DAY);
    }

    struct Unreachable;

    impl UserFetcher for Unreachable {
        async fn user_with_mapsets(&self, user_id: i64) -> Result<UserCard, FetchError> {
            Err(format!("user {user_id} unreachable").into())
        }
    }

    #[tokio::test]
    async fn stops_on_shutdown() {
        let store = Store::connect("sqlite::memory:").await.unwrap();
        let tracker = Arc::new(Tracker::new(store, Unreachable, Duration::ZERO));
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(run(tracker, DAY, rx));
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();
    }
}
