use super::{DbResult, PostRepository};
use crate::models::{NewPost, Post, PostUpdate};
use sqlx::PgPool;

pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PostRepository for PgPostRepository {
    async fn list(&self, limit: Option<i64>, offset: i64) -> DbResult<Vec<Post>> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, user_id, content, image, created_at, updated_at
            FROM posts
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn find_by_id(&self, id: i32) -> DbResult<Option<Post>> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, user_id, content, image, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_by_ids(&self, ids: &[i32]) -> DbResult<Vec<Post>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, user_id, content, image, created_at, updated_at
            FROM posts
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_by_user(&self, user_id: i32) -> DbResult<Vec<Post>> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, user_id, content, image, created_at, updated_at
            FROM posts
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn insert(&self, post: NewPost) -> DbResult<Post> {
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (user_id, content, image)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, content, image, created_at, updated_at
            "#,
        )
        .bind(post.user_id)
        .bind(&post.content)
        .bind(&post.image)
        .fetch_one(&self.pool)
        .await
    }

    async fn update(&self, id: i32, update: PostUpdate) -> DbResult<Option<Post>> {
        sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET content = COALESCE($2, content),
                image = CASE WHEN $3 THEN $4 ELSE image END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, content, image, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&update.content)
        .bind(update.image.is_some())
        .bind(update.image.flatten())
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete(&self, id: i32) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
