use chrono::{DateTime, Utc};

use crate::entities::{TrackRun, UnitOfWork};
use crate::error::Result;

impl UnitOfWork<'_> {
    /// Record a completed polling pass.
    pub async fn create_track_run(&mut self, tracked_at: DateTime<Utc>) -> Result<TrackRun> {
        self.ensure_writable()?;
        let result = sqlx::query("INSERT INTO track (tracked_at) VALUES (?1)")
            .bind(tracked_at)
            .execute(self.conn())
            .await?;
        Ok(TrackRun {
            id: result.last_insert_rowid(),
            tracked_at,
        })
    }

    /// The most recent completed pass, if any pass ever completed.
    pub async fn last_track_run(&mut self) -> Result<Option<TrackRun>> {
        let row: Option<(i64, DateTime<Utc>)> =
            sqlx::query_as("SELECT id, tracked_at FROM track ORDER BY tracked_at DESC, id DESC LIMIT 1")
                .fetch_optional(self.conn())
                .await?;
        Ok(row.map(|(id, tracked_at)| TrackRun { id, tracked_at }))
    }
}
