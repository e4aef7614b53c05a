use crate::db::Repositories;
use crate::error::{AppError, Result};
use crate::metrics::record_action;
use crate::middleware::Identity;
use crate::models::{CommentWithAuthor, NewNotification, NotificationKind, User};
use crate::services::notifications;
use crate::services::users::require_caller;
use crate::validators::required_text;
use std::collections::HashMap;

#[derive(Clone)]
pub struct CommentService {
    repos: Repositories,
}

impl CommentService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Comments on a post, newest first, with authors
    pub async fn list(&self, post_id: i32) -> Result<Vec<CommentWithAuthor>> {
        let comments = self.repos.comments.list_for_posts(&[post_id]).await?;

        let mut author_ids: Vec<i32> = comments.iter().map(|c| c.user_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();
        let authors: HashMap<i32, User> = self
            .repos
            .users
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(comments
            .into_iter()
            .map(|comment| CommentWithAuthor {
                author: authors.get(&comment.user_id).cloned(),
                comment,
            })
            .collect())
    }

    pub async fn create(
        &self,
        identity: &Identity,
        post_id: i32,
        content: Option<String>,
    ) -> Result<CommentWithAuthor> {
        let user = require_caller(&self.repos, identity).await?;
        let post = self
            .repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))?;

        let content = required_text(content.as_deref())
            .ok_or_else(|| AppError::bad_request("Comment content is required"))?;

        let comment = self.repos.comments.insert(post.id, user.id, &content).await?;
        record_action("comment_created");

        notifications::record(
            &self.repos,
            NewNotification {
                user_id: post.user_id,
                actor_id: user.id,
                kind: NotificationKind::Comment,
                post_id: Some(post.id),
                comment_id: Some(comment.id),
            },
        )
        .await;

        Ok(CommentWithAuthor {
            comment,
            author: Some(user),
        })
    }

    /// Allowed for the comment's author and the post's owner
    pub async fn delete(&self, identity: &Identity, comment_id: i32) -> Result<()> {
        let user = require_caller(&self.repos, identity).await?;
        let comment = self
            .repos
            .comments
            .find_by_id(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment not found"))?;

        let is_author = comment.user_id == user.id;
        let is_post_owner = match self.repos.posts.find_by_id(comment.post_id).await? {
            Some(post) => post.user_id == user.id,
            None => false,
        };

        if !is_author && !is_post_owner {
            return Err(AppError::forbidden("Unauthorized to delete this comment"));
        }

        if !self.repos.comments.delete(comment_id).await? {
            return Err(AppError::not_found("Comment not found"));
        }

        record_action("comment_deleted");
        tracing::info!(comment_id, user_id = user.id, "Comment deleted");
        Ok(())
    }
}
