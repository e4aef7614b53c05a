/// Domain models for socially-service
///
/// Rows map 1:1 onto the tables in `migrations/`. All JSON is camelCase;
/// hydrated views flatten the base row and add the related records.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// User profile row, keyed by the identity-provider subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub identity_id: String,
    pub email: String,
    pub username: Option<String>,
    pub name: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Name shown in rendered messages
    pub fn display_name(&self) -> &str {
        let name = self.name.trim();
        if !name.is_empty() {
            name
        } else {
            self.username.as_deref().unwrap_or("Someone")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i32,
    pub user_id: i32,
    pub content: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i32,
    pub post_id: i32,
    pub user_id: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: i32,
    pub post_id: i32,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
}

/// What a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Like,
    Comment,
    Follow,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Like => "like",
            NotificationKind::Comment => "comment",
            NotificationKind::Follow => "follow",
        }
    }

    /// Message body following the actor's name
    pub fn action_text(&self) -> &'static str {
        match self {
            NotificationKind::Like => "liked your post",
            NotificationKind::Comment => "commented on your post",
            NotificationKind::Follow => "started following you",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for NotificationKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "like" => Ok(NotificationKind::Like),
            "comment" => Ok(NotificationKind::Comment),
            "follow" => Ok(NotificationKind::Follow),
            other => Err(format!("unknown notification kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i32,
    /// Recipient
    pub user_id: i32,
    pub actor_id: i32,
    #[sqlx(try_from = "String")]
    pub kind: NotificationKind,
    pub post_id: Option<i32>,
    pub comment_id: Option<i32>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

// =====================================================================
// Write models
// =====================================================================

/// Fields for a brand-new user row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub identity_id: String,
    pub email: String,
    pub username: Option<String>,
    pub name: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
}

/// Profile edit submitted by the owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: String,
    pub username: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
}

/// Identity-driven sync of an existing row; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentitySync {
    pub email: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub user_id: i32,
    pub content: String,
    pub image: Option<String>,
}

/// Partial post edit; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostUpdate {
    pub content: Option<String>,
    /// `Some(None)` clears the image
    pub image: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: i32,
    pub actor_id: i32,
    pub kind: NotificationKind,
    pub post_id: Option<i32>,
    pub comment_id: Option<i32>,
}

// =====================================================================
// Hydrated views
// =====================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: Option<User>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeWithUser {
    #[serde(flatten)]
    pub like: Like,
    pub user: Option<User>,
}

/// Post with author, likes and comments (newest first)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<User>,
    pub likes: Vec<Like>,
    pub comments: Vec<CommentWithAuthor>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub posts: Vec<PostDetail>,
    pub follower_count: i64,
    pub following_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: Notification,
    pub actor: Option<User>,
    pub post: Option<Post>,
    pub message: String,
}

impl NotificationView {
    pub fn render_message(kind: NotificationKind, actor: Option<&User>) -> String {
        let who = actor.map(User::display_name).unwrap_or("Someone");
        format!("{} {}", who, kind.action_text())
    }
}
