use crate::db::{is_unique_violation, Repositories};
use crate::error::{AppError, Result};
use crate::middleware::Identity;
use crate::models::{IdentitySync, NewUser, ProfileUpdate, User, UserProfile};
use crate::services::posts::hydrate_posts;
use crate::validators::{
    derive_name, derive_username, is_reserved_username, normalize_optional, required_text,
    validate_username,
};
use chrono::Utc;

/// Numbered variants tried when a derived username is taken
const USERNAME_SUFFIX_ATTEMPTS: u32 = 20;

const USERNAME_TAKEN: &str = "Username is already taken";
const USERNAME_INVALID: &str = "Username can only contain letters, numbers, and underscores";
const USERNAME_RESERVED: &str = "Username is reserved";

/// Caller's row or 404 `User not found`
pub(crate) async fn require_caller(repos: &Repositories, identity: &Identity) -> Result<User> {
    repos
        .users
        .find_by_identity(identity.subject())
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

/// Body of `POST /api/users`
#[derive(Debug, Clone, Default)]
pub struct SyncUserInput {
    pub username: Option<String>,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
}

/// Body of `PATCH /api/users/profile`; omitted optional fields are kept
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    repos: Repositories,
}

impl UserService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Caller's row without creating it
    pub async fn current_user(&self, identity: &Identity) -> Result<User> {
        self.repos
            .users
            .find_by_identity(identity.subject())
            .await?
            .ok_or_else(|| AppError::not_found("User not found in database"))
    }

    /// Caller's row, created from the session claims on first sight.
    /// Returns `(user, created)`.
    pub async fn get_or_create(&self, identity: &Identity) -> Result<(User, bool)> {
        if let Some(user) = self.repos.users.find_by_identity(identity.subject()).await? {
            return Ok((user, false));
        }

        let claims = identity.claims();
        let base = derive_username(
            claims.username.as_deref(),
            claims.email.as_deref(),
            Utc::now().timestamp_millis(),
        );

        let new_user = NewUser {
            identity_id: claims.sub.clone(),
            email: claims.email.clone().unwrap_or_default(),
            username: self.available_username(&base).await?,
            name: derive_name(claims.first_name.as_deref(), claims.last_name.as_deref()),
            bio: None,
            image: claims.image_url.clone(),
            location: None,
            website: None,
        };

        match self.repos.users.insert(new_user.clone()).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, "Created user from identity session");
                Ok((user, true))
            }
            Err(err) if is_unique_violation(&err) => {
                if let Some(user) = self.repos.users.find_by_identity(identity.subject()).await? {
                    return Ok((user, false));
                }

                // Derived username claimed by a concurrent signup
                tracing::debug!(username = ?new_user.username, "Derived username taken; retrying");
                let retry = NewUser {
                    username: self.available_username(&base).await?,
                    ..new_user
                };
                self.insert_or_reload(identity, retry).await
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Create or refresh the caller's row from claims plus the request body.
    /// Returns `(user, created)`.
    pub async fn sync(&self, identity: &Identity, input: SyncUserInput) -> Result<(User, bool)> {
        let claims = identity.claims();
        let requested_username = required_text(input.username.as_deref());

        if let Some(username) = requested_username.as_deref() {
            self.ensure_username_available(username, identity.subject())
                .await?;
        }

        let name = required_text(input.name.as_deref()).unwrap_or_else(|| {
            derive_name(claims.first_name.as_deref(), claims.last_name.as_deref())
        });

        match self.repos.users.find_by_identity(identity.subject()).await? {
            Some(existing) => {
                let sync = IdentitySync {
                    email: claims.email.clone(),
                    username: requested_username,
                    name: Some(name),
                    bio: normalize_optional(input.bio),
                    image: claims.image_url.clone(),
                    location: normalize_optional(input.location),
                    website: normalize_optional(input.website),
                };

                let user = self
                    .repos
                    .users
                    .sync_from_identity(existing.id, sync)
                    .await
                    .map_err(username_conflict)?
                    .ok_or_else(|| AppError::not_found("User not found"))?;

                Ok((user, false))
            }
            None => {
                let username = match requested_username {
                    Some(username) => Some(username),
                    None => {
                        let base = derive_username(
                            claims.username.as_deref(),
                            claims.email.as_deref(),
                            Utc::now().timestamp_millis(),
                        );
                        self.available_username(&base).await?
                    }
                };

                let new_user = NewUser {
                    identity_id: claims.sub.clone(),
                    email: claims.email.clone().unwrap_or_default(),
                    username,
                    name,
                    bio: normalize_optional(input.bio),
                    image: claims.image_url.clone(),
                    location: normalize_optional(input.location),
                    website: normalize_optional(input.website),
                };

                self.insert_or_reload(identity, new_user).await
            }
        }
    }

    /// Apply a profile edit made by the owner
    pub async fn update_profile(&self, identity: &Identity, changes: ProfileChanges) -> Result<User> {
        let (name, username) = match (
            required_text(changes.name.as_deref()),
            required_text(changes.username.as_deref()),
        ) {
            (Some(name), Some(username)) => (name, username),
            _ => return Err(AppError::bad_request("Name and username are required")),
        };

        check_username(&username)?;

        self.ensure_username_available(&username, identity.subject())
            .await?;

        let user = require_caller(&self.repos, identity).await?;

        let update = ProfileUpdate {
            name,
            username,
            bio: merge_optional(changes.bio, user.bio),
            image: merge_optional(changes.image, user.image),
            location: merge_optional(changes.location, user.location),
            website: merge_optional(changes.website, user.website),
        };

        let updated = self
            .repos
            .users
            .update_profile(user.id, update)
            .await
            .map_err(username_conflict)?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        tracing::info!(user_id = updated.id, "Profile updated");
        Ok(updated)
    }

    /// Public profile with posts and follow counts
    pub async fn profile(&self, username: &str) -> Result<UserProfile> {
        let user = self.find_by_username(username).await?;

        let (posts, follower_count, following_count) = futures::try_join!(
            self.repos.posts.list_by_user(user.id),
            self.repos.follows.count_followers(user.id),
            self.repos.follows.count_following(user.id),
        )?;

        let posts = hydrate_posts(&self.repos, posts).await?;

        Ok(UserProfile {
            user,
            posts,
            follower_count,
            following_count,
        })
    }

    pub async fn followers(&self, username: &str) -> Result<Vec<User>> {
        let user = self.find_by_username(username).await?;
        Ok(self.repos.follows.list_followers(user.id).await?)
    }

    pub async fn following(&self, username: &str) -> Result<Vec<User>> {
        let user = self.find_by_username(username).await?;
        Ok(self.repos.follows.list_following(user.id).await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<User> {
        self.repos
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// 400 unless `username` is well-formed and unused by anyone but `identity_id`
    async fn ensure_username_available(&self, username: &str, identity_id: &str) -> Result<()> {
        check_username(username)?;

        match self.repos.users.find_by_username(username).await? {
            Some(owner) if owner.identity_id != identity_id => {
                Err(AppError::bad_request(USERNAME_TAKEN))
            }
            _ => Ok(()),
        }
    }

    /// `base` or the first free numbered variant; `None` leaves the username unset
    async fn available_username(&self, base: &str) -> Result<Option<String>> {
        for attempt in 0..=USERNAME_SUFFIX_ATTEMPTS {
            let candidate = if attempt == 0 {
                base.to_string()
            } else {
                format!("{base}{attempt}")
            };

            if validate_username(&candidate)
                && self.repos.users.find_by_username(&candidate).await?.is_none()
            {
                return Ok(Some(candidate));
            }
        }

        tracing::warn!(base = %base, "No free username variant; leaving username unset");
        Ok(None)
    }

    /// Insert, or return the row a concurrent first request created
    async fn insert_or_reload(&self, identity: &Identity, new_user: NewUser) -> Result<(User, bool)> {
        match self.repos.users.insert(new_user).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, "Created user from identity session");
                Ok((user, true))
            }
            Err(err) if is_unique_violation(&err) => {
                match self.repos.users.find_by_identity(identity.subject()).await? {
                    Some(user) => Ok((user, false)),
                    None => Err(username_conflict(err)),
                }
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn check_username(username: &str) -> Result<()> {
    if is_reserved_username(username) {
        Err(AppError::bad_request(USERNAME_RESERVED))
    } else if !validate_username(username) {
        Err(AppError::bad_request(USERNAME_INVALID))
    } else {
        Ok(())
    }
}

/// `None` keeps `current`; a blank value clears it
fn merge_optional(change: Option<String>, current: Option<String>) -> Option<String> {
    match change {
        Some(value) => normalize_optional(Some(value)),
        None => current,
    }
}

/// Unique violations on write can only come from the username column
fn username_conflict(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::bad_request(USERNAME_TAKEN)
    } else {
        AppError::from(err)
    }
}
