use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::entities::{EntityKind, Record, UnitOfWork, User};
use crate::error::{CoreError, Result};

impl Record for User {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> i64 {
        self.id
    }

    fn stats(&self) -> &str {
        &self.user_stats
    }

    fn set_stats(&mut self, stats: String) {
        self.user_stats = stats;
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
        self.created_at = created_at;
        self.updated_at = updated_at;
    }

    async fn exists_in(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    async fn fetch_from(conn: &mut SqliteConnection, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, username, avatar_url, graveyard_beatmapset_count, unranked_beatmapset_count, \
                    user_stats, created_at, updated_at \
             FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
    }

    async fn insert_into(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO users (id, username, avatar_url, graveyard_beatmapset_count, \
                                unranked_beatmapset_count, user_stats, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(self.id)
        .bind(&self.username)
        .bind(&self.avatar_url)
        .bind(self.graveyard_beatmapset_count)
        .bind(self.unranked_beatmapset_count)
        .bind(&self.user_stats)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    async fn update_in(&self, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET username = ?1, avatar_url = ?2, graveyard_beatmapset_count = ?3, \
                              unranked_beatmapset_count = ?4, user_stats = ?5, created_at = ?6, \
                              updated_at = ?7 \
             WHERE id = ?8",
        )
        .bind(&self.username)
        .bind(&self.avatar_url)
        .bind(self.graveyard_beatmapset_count)
        .bind(self.unranked_beatmapset_count)
        .bind(&self.user_stats)
        .bind(self.created_at)
        .bind(self.updated_at)
        .bind(self.id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }
}

impl UnitOfWork<'_> {
    /// Look a user up by display name (exact match).
    pub async fn user_by_name(&mut self, username: &str) -> Result<User> {
        let user: Option<User> = sqlx::query_as(
            "SELECT id, username, avatar_url, graveyard_beatmapset_count, unranked_beatmapset_count, \
                    user_stats, created_at, updated_at \
             FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(self.conn())
        .await?;
        user.ok_or_else(|| CoreError::UnknownUsername(username.to_owned()))
    }

    pub async fn list_users(&mut self) -> Result<Vec<User>> {
        Ok(sqlx::query_as(
            "SELECT id, username, avatar_url, graveyard_beatmapset_count, unranked_beatmapset_count, \
                    user_stats, created_at, updated_at \
             FROM users ORDER BY username",
        )
        .fetch_all(self.conn())
        .await?)
    }
}
