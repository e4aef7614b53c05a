/// Data access layer
///
/// Services talk to the store only through the repository traits below.
/// [`Repositories::postgres`] wires the sqlx implementations; tests plug in
/// their own.
use crate::models::{
    Comment, IdentitySync, Like, NewNotification, NewPost, NewUser, Notification, Post,
    PostUpdate, ProfileUpdate, User,
};
use sqlx::migrate::Migrator;
use sqlx::PgPool;
use std::sync::Arc;

pub mod comment_repo;
pub mod follow_repo;
pub mod like_repo;
pub mod notification_repo;
pub mod post_repo;
pub mod user_repo;

/// Schema migrations embedded at compile time
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub type DbResult<T> = Result<T, sqlx::Error>;

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_identity(&self, identity_id: &str) -> DbResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> DbResult<Option<User>>;

    /// Users for the given ids, in no particular order; unknown ids are skipped
    async fn find_by_ids(&self, ids: &[i32]) -> DbResult<Vec<User>>;

    async fn insert(&self, user: NewUser) -> DbResult<User>;

    /// Overwrite only the fields that are `Some`
    async fn sync_from_identity(&self, id: i32, sync: IdentitySync) -> DbResult<Option<User>>;

    async fn update_profile(&self, id: i32, update: ProfileUpdate) -> DbResult<Option<User>>;
}

#[async_trait::async_trait]
pub trait PostRepository: Send + Sync {
    /// Newest first; `None` returns every post after `offset`
    async fn list(&self, limit: Option<i64>, offset: i64) -> DbResult<Vec<Post>>;

    async fn find_by_id(&self, id: i32) -> DbResult<Option<Post>>;

    async fn find_by_ids(&self, ids: &[i32]) -> DbResult<Vec<Post>>;

    /// A user's posts, newest first
    async fn list_by_user(&self, user_id: i32) -> DbResult<Vec<Post>>;

    async fn insert(&self, post: NewPost) -> DbResult<Post>;

    async fn update(&self, id: i32, update: PostUpdate) -> DbResult<Option<Post>>;

    /// Removes the post with its comments, likes and notifications
    async fn delete(&self, id: i32) -> DbResult<bool>;
}

#[async_trait::async_trait]
pub trait CommentRepository: Send + Sync {
    /// Comments on any of `post_ids`, newest first
    async fn list_for_posts(&self, post_ids: &[i32]) -> DbResult<Vec<Comment>>;

    async fn find_by_id(&self, id: i32) -> DbResult<Option<Comment>>;

    async fn insert(&self, post_id: i32, user_id: i32, content: &str) -> DbResult<Comment>;

    async fn delete(&self, id: i32) -> DbResult<bool>;
}

#[async_trait::async_trait]
pub trait LikeRepository: Send + Sync {
    /// Likes on any of `post_ids`, newest first
    async fn list_for_posts(&self, post_ids: &[i32]) -> DbResult<Vec<Like>>;

    /// Flip the like; returns whether the post is now liked by `user_id`
    async fn toggle(&self, post_id: i32, user_id: i32) -> DbResult<bool>;
}

#[async_trait::async_trait]
pub trait FollowRepository: Send + Sync {
    async fn is_following(&self, follower_id: i32, following_id: i32) -> DbResult<bool>;

    /// Flip the follow; returns whether `follower_id` now follows `following_id`
    async fn toggle(&self, follower_id: i32, following_id: i32) -> DbResult<bool>;

    async fn count_followers(&self, user_id: i32) -> DbResult<i64>;

    async fn count_following(&self, user_id: i32) -> DbResult<i64>;

    /// Users following `user_id`, most recent first
    async fn list_followers(&self, user_id: i32) -> DbResult<Vec<User>>;

    /// Users `user_id` follows, most recent first
    async fn list_following(&self, user_id: i32) -> DbResult<Vec<User>>;
}

#[async_trait::async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: NewNotification) -> DbResult<Notification>;

    /// Recipient's notifications, newest first
    async fn list_for_user(&self, user_id: i32) -> DbResult<Vec<Notification>>;

    /// Only marks the row when it belongs to `user_id`
    async fn mark_read(&self, id: i32, user_id: i32) -> DbResult<bool>;

    async fn mark_all_read(&self, user_id: i32) -> DbResult<u64>;

    async fn count_unread(&self, user_id: i32) -> DbResult<i64>;
}

/// Store round-trip used by readiness probes
#[async_trait::async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> DbResult<()>;
}

/// Bundle of repositories shared by all services
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub likes: Arc<dyn LikeRepository>,
    pub follows: Arc<dyn FollowRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub health: Arc<dyn StoreHealth>,
}

impl Repositories {
    /// Postgres-backed repositories sharing one pool
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(user_repo::PgUserRepository::new(pool.clone())),
            posts: Arc::new(post_repo::PgPostRepository::new(pool.clone())),
            comments: Arc::new(comment_repo::PgCommentRepository::new(pool.clone())),
            likes: Arc::new(like_repo::PgLikeRepository::new(pool.clone())),
            follows: Arc::new(follow_repo::PgFollowRepository::new(pool.clone())),
            notifications: Arc::new(notification_repo::PgNotificationRepository::new(
                pool.clone(),
            )),
            health: Arc::new(PgStoreHealth { pool }),
        }
    }
}

struct PgStoreHealth {
    pool: PgPool,
}

#[async_trait::async_trait]
impl StoreHealth for PgStoreHealth {
    async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map(|_| ())
    }
}

/// Whether `err` is a Postgres unique-constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
