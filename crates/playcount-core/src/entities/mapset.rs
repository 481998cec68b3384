use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::SqliteConnection;

use crate::entities::{EntityKind, Mapset, Record, UnitOfWork};
use crate::error::Result;

impl Record for Mapset {
    const KIND: EntityKind = EntityKind::Mapset;

    fn id(&self) -> i64 {
        self.id
    }

    fn stats(&self) -> &str {
        &self.mapset_stats
    }

    fn set_stats(&mut self, stats: String) {
        self.mapset_stats = stats;
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
        self.created_at = created_at;
        self.updated_at = updated_at;
    }

    async fn exists_in(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM mapsets WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    async fn fetch_from(conn: &mut SqliteConnection, id: i64) -> Result<Option<Mapset>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, user_id, artist, title, covers, status, last_updated, creator, preview_url, \
                    tags, bpm, mapset_stats, created_at, updated_at \
             FROM mapsets WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
    }

    async fn insert_into(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO mapsets (id, user_id, artist, title, covers, status, last_updated, creator, \
                                  preview_url, tags, bpm, mapset_stats, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        )
        .bind(self.id)
        .bind(self.user_id)
        .bind(&self.artist)
        .bind(&self.title)
        .bind(Json(&self.covers))
        .bind(self.status)
        .bind(self.last_updated)
        .bind(&self.creator)
        .bind(&self.preview_url)
        .bind(&self.tags)
        .bind(self.bpm)
        .bind(&self.mapset_stats)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    async fn update_in(&self, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE mapsets SET user_id = ?1, artist = ?2, title = ?3, covers = ?4, status = ?5, \
                                last_updated = ?6, creator = ?7, preview_url = ?8, tags = ?9, \
                                bpm = ?10, mapset_stats = ?11, created_at = ?12, updated_at = ?13 \
             WHERE id = ?14",
        )
        .bind(self.user_id)
        .bind(&self.artist)
        .bind(&self.title)
        .bind(Json(&self.covers))
        .bind(self.status)
        .bind(self.last_updated)
        .bind(&self.creator)
        .bind(&self.preview_url)
        .bind(&self.tags)
        .bind(self.bpm)
        .bind(&self.mapset_stats)
        .bind(self.created_at)
        .bind(self.updated_at)
        .bind(self.id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }
}

impl UnitOfWork<'_> {
    /// Mapsets owned by `user_id`, most recently updated upstream first.
    pub async fn list_mapsets_for_user(&mut self, user_id: i64) -> Result<Vec<Mapset>> {
        Ok(sqlx::query_as(
            "SELECT id, user_id, artist, title, covers, status, last_updated, creator, preview_url, \
                    tags, bpm, mapset_stats, created_at, updated_at \
             FROM mapsets WHERE user_id = ?1 ORDER BY last_updated DESC, id",
        )
        .bind(user_id)
        .fetch_all(self.conn())
        .await?)
    }

    /// One page of all mapsets ordered by ID.
    pub async fn list_mapsets(&mut self, limit: i64, offset: i64) -> Result<Vec<Mapset>> {
        Ok(sqlx::query_as(
            "SELECT id, user_id, artist, title, covers, status, last_updated, creator, preview_url, \
                    tags, bpm, mapset_stats, created_at, updated_at \
             FROM mapsets ORDER BY id LIMIT ?1 OFFSET ?2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.conn())
        .await?)
    }

    pub async fn count_mapsets(&mut self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM mapsets")
            .fetch_one(self.conn())
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::entities::tests::{at, memory_store, user};
    use crate::entities::RankStatus;
    use crate::error::CoreError;

    pub(crate) fn mapset(id: i64, user_id: i64) -> Mapset {
        Mapset {
            id,
            user_id,
            artist: "artist".to_owned(),
            title: format!("title {id}"),
            covers: BTreeMap::from([
                ("cover".to_owned(), format!("https://assets.ppy.sh/{id}/cover.jpg")),
                ("card".to_owned(), format!("https://assets.ppy.sh/{id}/card.jpg")),
            ]),
            status: RankStatus::Graveyard,
            last_updated: at(2023, 12, 1),
            creator: "mapper".to_owned(),
            preview_url: format!("//b.ppy.sh/preview/{id}.mp3"),
            tags: "tags tags".to_owned(),
            bpm: 150.0,
            mapset_stats: "{}".to_owned(),
            created_at: at(2023, 12, 24),
            updated_at: at(2023, 12, 24),
        }
    }

    #[tokio::test]
    async fn covers_and_status_round_trip() {
        let store = memory_store().await;
        let mut uow = store.read_write().await.unwrap();
        uow.create(&user(1, "owner")).await.unwrap();
        let mut original = mapset(10, 1);
        original.status = RankStatus::Loved;
        uow.create(&original).await.unwrap();

        let stored: Mapset = uow.get(10).await.unwrap();
        assert_eq!(stored, original);
    }

    #[tokio::test]
    async fn mapset_requires_existing_owner() {
        let store = memory_store().await;
        let mut uow = store.read_write().await.unwrap();
        let err = uow.create(&mapset(10, 999)).await.unwrap_err();
        assert!(matches!(err, CoreError::Database(_)));
    }

    #[tokio::test]
    async fn paging_and_per_user_listing() {
        let store = memory_store().await;
        let mut uow = store.read_write().await.unwrap();
        uow.create(&user(1, "one")).await.unwrap();
        uow.create(&user(2, "two")).await.unwrap();
        for (id, owner) in [(1, 1), (2, 2), (3, 1), (4, 1)] {
            uow.create(&mapset(id, owner)).await.unwrap();
        }

        assert_eq!(uow.count_mapsets().await.unwrap(), 4);
        let page: Vec<i64> = uow.list_mapsets(2, 2).await.unwrap().iter().map(|m| m.id).collect();
        assert_eq!(page, [3, 4]);
        let owned: Vec<i64> = uow
            .list_mapsets_for_user(1)
            .await
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(owned, [1, 3, 4]);
    }
}
