use super::{CommentRepository, DbResult};
use crate::models::Comment;
use sqlx::PgPool;

pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CommentRepository for PgCommentRepository {
    async fn list_for_posts(&self, post_ids: &[i32]) -> DbResult<Vec<Comment>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, user_id, content, created_at
            FROM comments
            WHERE post_id = ANY($1)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await
    }

    async fn find_by_id(&self, id: i32) -> DbResult<Option<Comment>> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, user_id, content, created_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn insert(&self, post_id: i32, user_id: i32, content: &str) -> DbResult<Comment> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (post_id, user_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, post_id, user_id, content, created_at
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete(&self, id: i32) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
