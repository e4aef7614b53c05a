use super::{DbResult, FollowRepository};
use crate::models::User;
use sqlx::PgPool;

pub struct PgFollowRepository {
    pool: PgPool,
}

impl PgFollowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FollowRepository for PgFollowRepository {
    async fn is_following(&self, follower_id: i32, following_id: i32) -> DbResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM follows WHERE follower_id = $1 AND following_id = $2
            )
            "#,
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn toggle(&self, follower_id: i32, following_id: i32) -> DbResult<bool> {
        let removed =
            sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
                .bind(follower_id)
                .bind(following_id)
                .execute(&self.pool)
                .await?
                .rows_affected();

        if removed > 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO follows (follower_id, following_id)
            VALUES ($1, $2)
            ON CONFLICT (follower_id, following_id) DO NOTHING
            "#,
        )
        .bind(follower_id)
        .bind(following_id)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    async fn count_followers(&self, user_id: i32) -> DbResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE following_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn count_following(&self, user_id: i32) -> DbResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn list_followers(&self, user_id: i32) -> DbResult<Vec<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.identity_id, u.email, u.username, u.name, u.bio, u.image,
                   u.location, u.website, u.created_at, u.updated_at
            FROM follows f
            JOIN users u ON u.id = f.follower_id
            WHERE f.following_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_following(&self, user_id: i32) -> DbResult<Vec<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.identity_id, u.email, u.username, u.name, u.bio, u.image,
                   u.location, u.website, u.created_at, u.updated_at
            FROM follows f
            JOIN users u ON u.id = f.following_id
            WHERE f.follower_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}
