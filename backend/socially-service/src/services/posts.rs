use crate::db::Repositories;
use crate::error::{AppError, Result};
use crate::metrics::record_action;
use crate::middleware::Identity;
use crate::models::{CommentWithAuthor, NewPost, Post, PostDetail, PostUpdate, User};
use crate::services::users::require_caller;
use crate::validators::{normalize_optional, required_text};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

pub const MAX_FEED_LIMIT: i64 = 100;

/// Feed window after clamping; no limit means the whole feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedPage {
    pub limit: Option<i64>,
    pub offset: i64,
}

impl FeedPage {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: limit.map(|l| l.clamp(1, MAX_FEED_LIMIT)),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

impl Default for FeedPage {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Answer of the ownership probe used by the post page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostOwnership {
    pub is_owner: bool,
    pub user_id: i32,
    pub post_user_id: i32,
}

/// Attach authors, likes and comments (with their authors) to `posts`,
/// keeping the input order
pub(crate) async fn hydrate_posts(repos: &Repositories, posts: Vec<Post>) -> Result<Vec<PostDetail>> {
    if posts.is_empty() {
        return Ok(Vec::new());
    }

    let post_ids: Vec<i32> = posts.iter().map(|p| p.id).collect();
    let (likes, comments) = futures::try_join!(
        repos.likes.list_for_posts(&post_ids),
        repos.comments.list_for_posts(&post_ids),
    )?;

    let user_ids: Vec<i32> = posts
        .iter()
        .map(|p| p.user_id)
        .chain(comments.iter().map(|c| c.user_id))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let users: HashMap<i32, User> = repos
        .users
        .find_by_ids(&user_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let mut likes_by_post: HashMap<i32, Vec<_>> = HashMap::new();
    for like in likes {
        likes_by_post.entry(like.post_id).or_default().push(like);
    }

    let mut comments_by_post: HashMap<i32, Vec<CommentWithAuthor>> = HashMap::new();
    for comment in comments {
        let author = users.get(&comment.user_id).cloned();
        comments_by_post
            .entry(comment.post_id)
            .or_default()
            .push(CommentWithAuthor { comment, author });
    }

    Ok(posts
        .into_iter()
        .map(|post| PostDetail {
            author: users.get(&post.user_id).cloned(),
            likes: likes_by_post.remove(&post.id).unwrap_or_default(),
            comments: comments_by_post.remove(&post.id).unwrap_or_default(),
            post,
        })
        .collect())
}

#[derive(Clone)]
pub struct PostService {
    repos: Repositories,
}

impl PostService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// All posts newest first, hydrated
    pub async fn feed(&self, page: FeedPage) -> Result<Vec<PostDetail>> {
        let posts = self.repos.posts.list(page.limit, page.offset).await?;
        hydrate_posts(&self.repos, posts).await
    }

    pub async fn get(&self, post_id: i32) -> Result<PostDetail> {
        let post = self.find(post_id).await?;
        let mut hydrated = hydrate_posts(&self.repos, vec![post]).await?;
        hydrated
            .pop()
            .ok_or_else(|| AppError::not_found("Post not found"))
    }

    pub async fn create(
        &self,
        identity: &Identity,
        content: Option<String>,
        image: Option<String>,
    ) -> Result<Post> {
        let user = require_caller(&self.repos, identity).await?;

        let content = required_text(content.as_deref())
            .ok_or_else(|| AppError::bad_request("Content is required"))?;

        let post = self
            .repos
            .posts
            .insert(NewPost {
                user_id: user.id,
                content,
                image: normalize_optional(image),
            })
            .await?;

        record_action("post_created");
        tracing::info!(post_id = post.id, user_id = user.id, "Post created");
        Ok(post)
    }

    /// Owner-only edit. Omitted fields are kept; a blank `image` clears it.
    pub async fn update(
        &self,
        identity: &Identity,
        post_id: i32,
        content: Option<String>,
        image: Option<String>,
    ) -> Result<Post> {
        let user = require_caller(&self.repos, identity).await?;
        let post = self.find(post_id).await?;

        if post.user_id != user.id {
            return Err(AppError::forbidden("Unauthorized to update this post"));
        }

        let content = match content {
            Some(text) => Some(
                required_text(Some(&text))
                    .ok_or_else(|| AppError::bad_request("Content is required"))?,
            ),
            None => None,
        };

        let update = PostUpdate {
            content,
            image: image.map(|i| normalize_optional(Some(i))),
        };

        self.repos
            .posts
            .update(post_id, update)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))
    }

    /// Owner-only delete; comments, likes and notifications go with it
    pub async fn delete(&self, identity: &Identity, post_id: i32) -> Result<()> {
        let user = require_caller(&self.repos, identity).await?;
        let post = self.find(post_id).await?;

        if post.user_id != user.id {
            return Err(AppError::forbidden("Unauthorized to delete this post"));
        }

        if !self.repos.posts.delete(post_id).await? {
            return Err(AppError::not_found("Post not found"));
        }

        record_action("post_deleted");
        tracing::info!(post_id, user_id = user.id, "Post deleted");
        Ok(())
    }

    pub async fn check_ownership(&self, identity: &Identity, post_id: i32) -> Result<PostOwnership> {
        let user = require_caller(&self.repos, identity).await?;
        let post = self.find(post_id).await?;

        Ok(PostOwnership {
            is_owner: post.user_id == user.id,
            user_id: user.id,
            post_user_id: post.user_id,
        })
    }

    async fn find(&self, post_id: i32) -> Result<Post> {
        self.repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))
    }
}
