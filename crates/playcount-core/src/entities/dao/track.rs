use chrono::{DateTime, Utc};

/// A row in the `track` table, written after every completed polling pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRun {
    pub id: i64,
    pub tracked_at: DateTime<Utc>,
}
