use chrono::{DateTime, Utc};

use crate::entities::{unique_violation, EntityKind, Following, UnitOfWork};
use crate::error::{CoreError, Result};

impl UnitOfWork<'_> {
    /// Start following a user. Following the same ID twice is
    /// [`CoreError::AlreadyExists`].
    pub async fn create_following(&mut self, following: &Following) -> Result<()> {
        self.ensure_writable()?;
        sqlx::query("INSERT INTO following (id, username, created_at) VALUES (?1, ?2, ?3)")
            .bind(following.id)
            .bind(&following.username)
            .bind(following.created_at)
            .execute(self.conn())
            .await
            .map_err(|e| unique_violation(e, EntityKind::Following, following.id))?;
        Ok(())
    }

    /// Every followed user, in the order they were added.
    pub async fn list_following(&mut self) -> Result<Vec<Following>> {
        let rows: Vec<(i64, String, DateTime<Utc>)> =
            sqlx::query_as("SELECT id, username, created_at FROM following ORDER BY created_at, id")
                .fetch_all(self.conn())
                .await?;
        Ok(rows
            .into_iter()
            .map(|(id, username, created_at)| Following {
                id,
                username,
                created_at,
            })
            .collect())
    }

    /// Stop following a user. Stored statistics are left untouched.
    pub async fn delete_following(&mut self, id: i64) -> Result<()> {
        self.ensure_writable()?;
        let result = sqlx::query("DELETE FROM following WHERE id = ?1")
            .bind(id)
            .execute(self.conn())
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound {
                kind: EntityKind::Following,
                id,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::tests::{at, memory_store};

    fn following(id: i64, username: &str, day: u32) -> Following {
        Following {
            id,
            username: username.to_owned(),
            created_at: at(2024, 1, day),
        }
    }

    #[tokio::test]
    async fn follow_list_unfollow() {
        let store = memory_store().await;
        let mut uow = store.read_write().await.unwrap();
        uow.create_following(&following(20, "second", 2)).await.unwrap();
        uow.create_following(&following(10, "first", 1)).await.unwrap();

        let ids: Vec<i64> = uow.list_following().await.unwrap().iter().map(|f| f.id).collect();
        assert_eq!(ids, [10, 20]);

        uow.delete_following(10).await.unwrap();
        assert_eq!(uow.list_following().await.unwrap(), [following(20, "second", 2)]);

        assert!(matches!(
            uow.delete_following(10).await.unwrap_err(),
            CoreError::NotFound { kind: EntityKind::Following, id: 10 }
        ));
    }

    #[tokio::test]
    async fn following_twice_is_rejected() {
        let store = memory_store().await;
        let mut uow = store.read_write().await.unwrap();
        uow.create_following(&following(10, "first", 1)).await.unwrap();
        assert!(matches!(
            uow.create_following(&following(10, "again", 2)).await.unwrap_err(),
            CoreError::AlreadyExists { kind: EntityKind::Following, id: 10 }
        ));
    }
}
