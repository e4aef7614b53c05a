//! Shared fixtures for the HTTP integration tests
//!
//! [`MemoryStore`] implements every repository trait over plain vectors so
//! the full route table can be driven without PostgreSQL. Tokens are signed
//! with the fixed test key pair from `crypto_core::test_keys`.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use crypto_core::jwt::{self, SessionClaims, VerifierSettings};
use crypto_core::test_keys::{PRIVATE_KEY_PEM, PUBLIC_KEY_PEM};
use socially_service::db::{
    CommentRepository, DbResult, FollowRepository, LikeRepository, NotificationRepository,
    PostRepository, Repositories, StoreHealth, UserRepository,
};
use socially_service::models::{
    Comment, IdentitySync, Like, NewNotification, NewPost, NewUser, Notification, Post,
    PostUpdate, ProfileUpdate, User,
};
use std::sync::{Arc, Mutex, Once};

/// Build the service under test around a [`MemoryStore`]
macro_rules! test_app {
    ($store:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($store.repositories()))
                .wrap(socially_service::middleware::SessionAuthMiddleware)
                .configure(socially_service::handlers::configure),
        )
        .await
    };
}

/// Send a request and return `(status, json body)`
macro_rules! send {
    ($app:expr, $req:expr) => {{
        let resp = actix_web::test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        (status, body)
    }};
}

/// Attach a bearer token to a `TestRequest`
pub fn authed(req: actix_web::test::TestRequest, token: &str) -> actix_web::test::TestRequest {
    req.insert_header(("Authorization", format!("Bearer {token}")))
}

static VERIFIER: Once = Once::new();

pub fn init_verifier() {
    VERIFIER.call_once(|| {
        jwt::initialize_session_verifier(PUBLIC_KEY_PEM, VerifierSettings::default())
            .expect("Failed to initialize test verifier");
    });
}

/// Session token for identity `sub` with the given provider username
pub fn token_for(sub: &str, username: &str) -> String {
    init_verifier();

    let now = Utc::now();
    let claims = SessionClaims {
        sub: sub.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(1)).timestamp(),
        iss: None,
        email: Some(format!("{username}@example.com")),
        username: Some(username.to_string()),
        first_name: Some(capitalize(username)),
        last_name: None,
        image_url: None,
    };

    jwt::sign_session_token(&claims, PRIVATE_KEY_PEM).expect("Failed to sign test token")
}

/// Token whose `exp` is already in the past
pub fn expired_token_for(sub: &str) -> String {
    init_verifier();

    let now = Utc::now();
    let claims = SessionClaims {
        sub: sub.to_string(),
        iat: (now - Duration::hours(2)).timestamp(),
        exp: (now - Duration::hours(1)).timestamp(),
        iss: None,
        email: None,
        username: None,
        first_name: None,
        last_name: None,
        image_url: None,
    };

    jwt::sign_session_token(&claims, PRIVATE_KEY_PEM).expect("Failed to sign test token")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Stand-in for PostgreSQL's unique-constraint error
#[derive(Debug)]
struct UniqueViolation;

impl std::fmt::Display for UniqueViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("duplicate key value violates unique constraint")
    }
}

impl std::error::Error for UniqueViolation {}

impl sqlx::error::DatabaseError for UniqueViolation {
    fn message(&self) -> &str {
        "duplicate key value violates unique constraint"
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> sqlx::error::ErrorKind {
        sqlx::error::ErrorKind::UniqueViolation
    }
}

fn unique_violation() -> sqlx::Error {
    sqlx::Error::Database(Box::new(UniqueViolation))
}

#[derive(Default)]
struct State {
    next_id: i32,
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    likes: Vec<Like>,
    /// (follower_id, following_id), oldest first
    follows: Vec<(i32, i32)>,
    notifications: Vec<Notification>,
}

impl State {
    fn id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: i32) -> Option<User> {
        self.users.iter().find(|u| u.id == id).cloned()
    }
}

/// In-memory store mirroring the PostgreSQL schema's cascade rules
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    /// When set, notification writes fail
    fail_notifications: Arc<Mutex<bool>>,
    /// Username lookups that report "free" regardless of the data
    stale_username_reads: Arc<Mutex<u32>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            users: Arc::new(self.clone()),
            posts: Arc::new(self.clone()),
            comments: Arc::new(self.clone()),
            likes: Arc::new(self.clone()),
            follows: Arc::new(self.clone()),
            notifications: Arc::new(self.clone()),
            health: Arc::new(self.clone()),
        }
    }

    pub fn fail_notification_writes(&self) {
        *self.fail_notifications.lock().unwrap() = true;
    }

    /// Make the next `n` username lookups miss, as a concurrent signup would
    pub fn stale_username_reads(&self, n: u32) {
        *self.stale_username_reads.lock().unwrap() = n;
    }

    pub fn notification_count(&self) -> usize {
        self.state.lock().unwrap().notifications.len()
    }

    pub fn comment_count(&self) -> usize {
        self.state.lock().unwrap().comments.len()
    }

    pub fn like_count(&self) -> usize {
        self.state.lock().unwrap().likes.len()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_identity(&self, identity_id: &str) -> DbResult<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .find(|u| u.identity_id == identity_id)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        {
            let mut stale = self.stale_username_reads.lock().unwrap();
            if *stale > 0 {
                *stale -= 1;
                return Ok(None);
            }
        }

        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .find(|u| u.username.as_deref() == Some(username))
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[i32]) -> DbResult<Vec<User>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn insert(&self, user: NewUser) -> DbResult<User> {
        let mut state = self.state.lock().unwrap();
        let taken = |u: &User| u.identity_id == user.identity_id
            || (user.username.is_some() && u.username == user.username);
        if state.users.iter().any(taken) {
            return Err(unique_violation());
        }
        let now = Utc::now();
        let row = User {
            id: state.id(),
            identity_id: user.identity_id,
            email: user.email,
            username: user.username,
            name: user.name,
            bio: user.bio,
            image: user.image,
            location: user.location,
            website: user.website,
            created_at: now,
            updated_at: now,
        };
        state.users.push(row.clone());
        Ok(row)
    }

    async fn sync_from_identity(&self, id: i32, sync: IdentitySync) -> DbResult<Option<User>> {
        let mut state = self.state.lock().unwrap();
        let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        if let Some(email) = sync.email {
            user.email = email;
        }
        if let Some(name) = sync.name {
            user.name = name;
        }
        user.username = sync.username.or(user.username.take());
        user.bio = sync.bio.or(user.bio.take());
        user.image = sync.image.or(user.image.take());
        user.location = sync.location.or(user.location.take());
        user.website = sync.website.or(user.website.take());
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn update_profile(&self, id: i32, update: ProfileUpdate) -> DbResult<Option<User>> {
        let mut state = self.state.lock().unwrap();
        let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        user.name = update.name;
        user.username = Some(update.username);
        user.bio = update.bio;
        user.image = update.image;
        user.location = update.location;
        user.website = update.website;
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn list(&self, limit: Option<i64>, offset: i64) -> DbResult<Vec<Post>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .posts
            .iter()
            .rev()
            .skip(offset as usize)
            .take(limit.map_or(usize::MAX, |l| l as usize))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i32) -> DbResult<Option<Post>> {
        let state = self.state.lock().unwrap();
        Ok(state.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i32]) -> DbResult<Vec<Post>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .posts
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn list_by_user(&self, user_id: i32) -> DbResult<Vec<Post>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .posts
            .iter()
            .rev()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, post: NewPost) -> DbResult<Post> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        let row = Post {
            id: state.id(),
            user_id: post.user_id,
            content: post.content,
            image: post.image,
            created_at: now,
            updated_at: now,
        };
        state.posts.push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: i32, update: PostUpdate) -> DbResult<Option<Post>> {
        let mut state = self.state.lock().unwrap();
        let Some(post) = state.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(content) = update.content {
            post.content = content;
        }
        if let Some(image) = update.image {
            post.image = image;
        }
        post.updated_at = Utc::now();

        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: i32) -> DbResult<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.posts.len();
        state.posts.retain(|p| p.id != id);
        if state.posts.len() == before {
            return Ok(false);
        }

        state.comments.retain(|c| c.post_id != id);
        state.likes.retain(|l| l.post_id != id);
        state.notifications.retain(|n| n.post_id != Some(id));
        Ok(true)
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn list_for_posts(&self, post_ids: &[i32]) -> DbResult<Vec<Comment>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .comments
            .iter()
            .rev()
            .filter(|c| post_ids.contains(&c.post_id))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i32) -> DbResult<Option<Comment>> {
        let state = self.state.lock().unwrap();
        Ok(state.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn insert(&self, post_id: i32, user_id: i32, content: &str) -> DbResult<Comment> {
        let mut state = self.state.lock().unwrap();
        let row = Comment {
            id: state.id(),
            post_id,
            user_id,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        state.comments.push(row.clone());
        Ok(row)
    }

    async fn delete(&self, id: i32) -> DbResult<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.comments.len();
        state.comments.retain(|c| c.id != id);
        if state.comments.len() == before {
            return Ok(false);
        }

        state.notifications.retain(|n| n.comment_id != Some(id));
        Ok(true)
    }
}

#[async_trait]
impl LikeRepository for MemoryStore {
    async fn list_for_posts(&self, post_ids: &[i32]) -> DbResult<Vec<Like>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .likes
            .iter()
            .rev()
            .filter(|l| post_ids.contains(&l.post_id))
            .cloned()
            .collect())
    }

    async fn toggle(&self, post_id: i32, user_id: i32) -> DbResult<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.likes.len();
        state
            .likes
            .retain(|l| !(l.post_id == post_id && l.user_id == user_id));
        if state.likes.len() != before {
            return Ok(false);
        }

        let row = Like {
            id: state.id(),
            post_id,
            user_id,
            created_at: Utc::now(),
        };
        state.likes.push(row);
        Ok(true)
    }
}

#[async_trait]
impl FollowRepository for MemoryStore {
    async fn is_following(&self, follower_id: i32, following_id: i32) -> DbResult<bool> {
        let state = self.state.lock().unwrap();
        Ok(state.follows.contains(&(follower_id, following_id)))
    }

    async fn toggle(&self, follower_id: i32, following_id: i32) -> DbResult<bool> {
        let mut state = self.state.lock().unwrap();
        let edge = (follower_id, following_id);
        if let Some(pos) = state.follows.iter().position(|f| *f == edge) {
            state.follows.remove(pos);
            Ok(false)
        } else {
            state.follows.push(edge);
            Ok(true)
        }
    }

    async fn count_followers(&self, user_id: i32) -> DbResult<i64> {
        let state = self.state.lock().unwrap();
        Ok(state.follows.iter().filter(|(_, to)| *to == user_id).count() as i64)
    }

    async fn count_following(&self, user_id: i32) -> DbResult<i64> {
        let state = self.state.lock().unwrap();
        Ok(state.follows.iter().filter(|(from, _)| *from == user_id).count() as i64)
    }

    async fn list_followers(&self, user_id: i32) -> DbResult<Vec<User>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .follows
            .iter()
            .rev()
            .filter(|(_, to)| *to == user_id)
            .filter_map(|(from, _)| state.user(*from))
            .collect())
    }

    async fn list_following(&self, user_id: i32) -> DbResult<Vec<User>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .follows
            .iter()
            .rev()
            .filter(|(from, _)| *from == user_id)
            .filter_map(|(_, to)| state.user(*to))
            .collect())
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn insert(&self, notification: NewNotification) -> DbResult<Notification> {
        if *self.fail_notifications.lock().unwrap() {
            return Err(sqlx::Error::PoolTimedOut);
        }

        let mut state = self.state.lock().unwrap();
        let row = Notification {
            id: state.id(),
            user_id: notification.user_id,
            actor_id: notification.actor_id,
            kind: notification.kind,
            post_id: notification.post_id,
            comment_id: notification.comment_id,
            read: false,
            created_at: Utc::now(),
        };
        state.notifications.push(row.clone());
        Ok(row)
    }

    async fn list_for_user(&self, user_id: i32) -> DbResult<Vec<Notification>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn mark_read(&self, id: i32, user_id: i32) -> DbResult<bool> {
        let mut state = self.state.lock().unwrap();
        match state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(n) => {
                n.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: i32) -> DbResult<u64> {
        let mut state = self.state.lock().unwrap();
        let mut updated = 0;
        for n in state
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.read)
        {
            n.read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn count_unread(&self, user_id: i32) -> DbResult<i64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .count() as i64)
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> DbResult<()> {
        Ok(())
    }
}
