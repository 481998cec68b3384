use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::entities::{Beatmap, EntityKind, Record, UnitOfWork};
use crate::error::Result;

impl Record for Beatmap {
    const KIND: EntityKind = EntityKind::Beatmap;

    fn id(&self) -> i64 {
        self.id
    }

    fn stats(&self) -> &str {
        &self.beatmap_stats
    }

    fn set_stats(&mut self, stats: String) {
        self.beatmap_stats = stats;
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
        self.created_at = created_at;
        self.updated_at = updated_at;
    }

    async fn exists_in(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM beatmaps WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    async fn fetch_from(conn: &mut SqliteConnection, id: i64) -> Result<Option<Beatmap>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, mapset_id, difficulty_rating, version, accuracy, ar, bpm, cs, status, url, \
                    total_length, user_id, last_updated, beatmap_stats, created_at, updated_at \
             FROM beatmaps WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
    }

    async fn insert_into(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO beatmaps (id, mapset_id, difficulty_rating, version, accuracy, ar, bpm, cs, \
                                   status, url, total_length, user_id, last_updated, beatmap_stats, \
                                   created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        )
        .bind(self.id)
        .bind(self.mapset_id)
        .bind(self.difficulty_rating)
        .bind(&self.version)
        .bind(self.accuracy)
        .bind(self.ar)
        .bind(self.bpm)
        .bind(self.cs)
        .bind(self.status)
        .bind(&self.url)
        .bind(self.total_length)
        .bind(self.user_id)
        .bind(self.last_updated)
        .bind(&self.beatmap_stats)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    async fn update_in(&self, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE beatmaps SET mapset_id = ?1, difficulty_rating = ?2, version = ?3, accuracy = ?4, \
                                 ar = ?5, bpm = ?6, cs = ?7, status = ?8, url = ?9, total_length = ?10, \
                                 user_id = ?11, last_updated = ?12, beatmap_stats = ?13, \
                                 created_at = ?14, updated_at = ?15 \
             WHERE id = ?16",
        )
        .bind(self.mapset_id)
        .bind(self.difficulty_rating)
        .bind(&self.version)
        .bind(self.accuracy)
        .bind(self.ar)
        .bind(self.bpm)
        .bind(self.cs)
        .bind(self.status)
        .bind(&self.url)
        .bind(self.total_length)
        .bind(self.user_id)
        .bind(self.last_updated)
        .bind(&self.beatmap_stats)
        .bind(self.created_at)
        .bind(self.updated_at)
        .bind(self.id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }
}

impl UnitOfWork<'_> {
    /// Difficulties of one mapset, easiest first.
    pub async fn list_beatmaps_for_mapset(&mut self, mapset_id: i64) -> Result<Vec<Beatmap>> {
        Ok(sqlx::query_as(
            "SELECT id, mapset_id, difficulty_rating, version, accuracy, ar, bpm, cs, status, url, \
                    total_length, user_id, last_updated, beatmap_stats, created_at, updated_at \
             FROM beatmaps WHERE mapset_id = ?1 ORDER BY difficulty_rating, id",
        )
        .bind(mapset_id)
        .fetch_all(self.conn())
        .await?)
    }
}
