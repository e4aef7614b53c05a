use crate::db::Repositories;
use crate::error::{AppError, Result};
use crate::metrics::record_action;
use crate::middleware::Identity;
use crate::models::{NewNotification, NotificationKind, User};
use crate::services::notifications;
use crate::services::users::require_caller;

#[derive(Clone)]
pub struct FollowService {
    repos: Repositories,
}

impl FollowService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Whether the caller follows `username`
    pub async fn status(&self, identity: &Identity, username: &str) -> Result<bool> {
        let (user, target) = self.resolve(identity, username).await?;
        Ok(self.repos.follows.is_following(user.id, target.id).await?)
    }

    /// Follow if not following, else unfollow. Returns whether the caller
    /// now follows `username`.
    pub async fn toggle(&self, identity: &Identity, username: &str) -> Result<bool> {
        let (user, target) = self.resolve(identity, username).await?;

        if user.id == target.id {
            return Err(AppError::bad_request("Cannot follow yourself"));
        }

        let following = self.repos.follows.toggle(user.id, target.id).await?;
        record_action(if following { "follow" } else { "unfollow" });

        if following {
            notifications::record(
                &self.repos,
                NewNotification {
                    user_id: target.id,
                    actor_id: user.id,
                    kind: NotificationKind::Follow,
                    post_id: None,
                    comment_id: None,
                },
            )
            .await;
        }

        Ok(following)
    }

    async fn resolve(&self, identity: &Identity, username: &str) -> Result<(User, User)> {
        let user = require_caller(&self.repos, identity).await?;
        let target = self
            .repos
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found("Target user not found"))?;

        Ok((user, target))
    }
}
