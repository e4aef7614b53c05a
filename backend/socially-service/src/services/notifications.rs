use crate::db::Repositories;
use crate::error::{AppError, Result};
use crate::metrics::NOTIFICATIONS_RECORDED_TOTAL;
use crate::middleware::Identity;
use crate::models::{NewNotification, NotificationView, Post, User};
use crate::services::users::require_caller;
use serde::Serialize;
use std::collections::HashMap;

/// Record a notification for its recipient
///
/// Best effort: self-actions are skipped and store failures are logged, so
/// the action that triggered the notification still succeeds.
pub(crate) async fn record(repos: &Repositories, notification: NewNotification) {
    if notification.user_id == notification.actor_id {
        return;
    }

    let kind = notification.kind;
    match repos.notifications.insert(notification).await {
        Ok(saved) => {
            NOTIFICATIONS_RECORDED_TOTAL
                .with_label_values(&[kind.as_str(), "ok"])
                .inc();
            tracing::debug!(
                notification_id = saved.id,
                recipient = saved.user_id,
                kind = %kind,
                "Notification recorded"
            );
        }
        Err(e) => {
            NOTIFICATIONS_RECORDED_TOTAL
                .with_label_values(&[kind.as_str(), "error"])
                .inc();
            tracing::warn!(kind = %kind, error = %e, "Failed to record notification");
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeed {
    pub notifications: Vec<NotificationView>,
    pub unread_count: i64,
}

#[derive(Clone)]
pub struct NotificationService {
    repos: Repositories,
}

impl NotificationService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Caller's notifications, newest first, with actor, post and message
    pub async fn list(&self, identity: &Identity) -> Result<NotificationFeed> {
        let user = require_caller(&self.repos, identity).await?;

        let (notifications, unread_count) = futures::try_join!(
            self.repos.notifications.list_for_user(user.id),
            self.repos.notifications.count_unread(user.id),
        )?;

        let mut actor_ids: Vec<i32> = notifications.iter().map(|n| n.actor_id).collect();
        actor_ids.sort_unstable();
        actor_ids.dedup();
        let mut post_ids: Vec<i32> = notifications.iter().filter_map(|n| n.post_id).collect();
        post_ids.sort_unstable();
        post_ids.dedup();

        let (actors, posts) = futures::try_join!(
            self.repos.users.find_by_ids(&actor_ids),
            self.repos.posts.find_by_ids(&post_ids),
        )?;
        let actors: HashMap<i32, User> = actors.into_iter().map(|u| (u.id, u)).collect();
        let posts: HashMap<i32, Post> = posts.into_iter().map(|p| (p.id, p)).collect();

        let notifications = notifications
            .into_iter()
            .map(|notification| {
                let actor = actors.get(&notification.actor_id).cloned();
                let post = notification.post_id.and_then(|id| posts.get(&id).cloned());
                let message = NotificationView::render_message(notification.kind, actor.as_ref());
                NotificationView {
                    notification,
                    actor,
                    post,
                    message,
                }
            })
            .collect();

        Ok(NotificationFeed {
            notifications,
            unread_count,
        })
    }

    pub async fn mark_read(&self, identity: &Identity, notification_id: i32) -> Result<()> {
        let user = require_caller(&self.repos, identity).await?;

        if self
            .repos
            .notifications
            .mark_read(notification_id, user.id)
            .await?
        {
            Ok(())
        } else {
            Err(AppError::not_found("Notification not found"))
        }
    }

    /// Returns how many notifications changed state
    pub async fn mark_all_read(&self, identity: &Identity) -> Result<u64> {
        let user = require_caller(&self.repos, identity).await?;
        Ok(self.repos.notifications.mark_all_read(user.id).await?)
    }
}
