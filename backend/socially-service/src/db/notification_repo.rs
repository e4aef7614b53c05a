use super::{DbResult, NotificationRepository};
use crate::models::{NewNotification, Notification};
use sqlx::PgPool;

pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn insert(&self, notification: NewNotification) -> DbResult<Notification> {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, actor_id, kind, post_id, comment_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, actor_id, kind, post_id, comment_id, read, created_at
            "#,
        )
        .bind(notification.user_id)
        .bind(notification.actor_id)
        .bind(notification.kind.as_str())
        .bind(notification.post_id)
        .bind(notification.comment_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_for_user(&self, user_id: i32) -> DbResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, actor_id, kind, post_id, comment_id, read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn mark_read(&self, id: i32, user_id: i32) -> DbResult<bool> {
        let result =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: i32) -> DbResult<u64> {
        let result =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE user_id = $1 AND read = FALSE")
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    async fn count_unread(&self, user_id: i32) -> DbResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }
}
