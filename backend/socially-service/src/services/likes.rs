use crate::db::Repositories;
use crate::error::{AppError, Result};
use crate::metrics::record_action;
use crate::middleware::Identity;
use crate::models::{LikeWithUser, NewNotification, NotificationKind, User};
use crate::services::notifications;
use crate::services::users::require_caller;
use std::collections::HashMap;

#[derive(Clone)]
pub struct LikeService {
    repos: Repositories,
}

impl LikeService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Likes on a post with the liking users
    pub async fn list(&self, post_id: i32) -> Result<Vec<LikeWithUser>> {
        let likes = self.repos.likes.list_for_posts(&[post_id]).await?;

        let user_ids: Vec<i32> = likes.iter().map(|l| l.user_id).collect();
        let users: HashMap<i32, User> = self
            .repos
            .users
            .find_by_ids(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(likes
            .into_iter()
            .map(|like| LikeWithUser {
                user: users.get(&like.user_id).cloned(),
                like,
            })
            .collect())
    }

    /// Like if not liked, else unlike. Returns whether the post is now liked.
    pub async fn toggle(&self, identity: &Identity, post_id: i32) -> Result<bool> {
        let user = require_caller(&self.repos, identity).await?;
        let post = self
            .repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))?;

        let liked = self.repos.likes.toggle(post.id, user.id).await?;
        record_action(if liked { "like" } else { "unlike" });

        if liked {
            notifications::record(
                &self.repos,
                NewNotification {
                    user_id: post.user_id,
                    actor_id: user.id,
                    kind: NotificationKind::Like,
                    post_id: Some(post.id),
                    comment_id: None,
                },
            )
            .await;
        }

        Ok(liked)
    }
}
