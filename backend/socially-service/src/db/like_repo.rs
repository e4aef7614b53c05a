use super::{DbResult, LikeRepository};
use crate::models::Like;
use sqlx::PgPool;

pub struct PgLikeRepository {
    pool: PgPool,
}

impl PgLikeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LikeRepository for PgLikeRepository {
    async fn list_for_posts(&self, post_ids: &[i32]) -> DbResult<Vec<Like>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Like>(
            r#"
            SELECT id, post_id, user_id, created_at
            FROM likes
            WHERE post_id = ANY($1)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await
    }

    async fn toggle(&self, post_id: i32, user_id: i32) -> DbResult<bool> {
        let removed = sqlx::query("DELETE FROM likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if removed > 0 {
            return Ok(false);
        }

        // A concurrent toggle may have inserted first; either way the post is liked
        sqlx::query(
            r#"
            INSERT INTO likes (post_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (post_id, user_id) DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }
}
