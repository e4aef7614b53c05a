use super::{DbResult, UserRepository};
use crate::models::{IdentitySync, NewUser, ProfileUpdate, User};
use sqlx::PgPool;

const USER_COLUMNS: &str = "id, identity_id, email, username, name, bio, image, location, website, created_at, updated_at";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_identity(&self, identity_id: &str) -> DbResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE identity_id = $1"
        ))
        .bind(identity_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_by_ids(&self, ids: &[i32]) -> DbResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
    }

    async fn insert(&self, user: NewUser) -> DbResult<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (identity_id, email, username, name, bio, image, location, website)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.identity_id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.name)
        .bind(&user.bio)
        .bind(&user.image)
        .bind(&user.location)
        .bind(&user.website)
        .fetch_one(&self.pool)
        .await
    }

    async fn sync_from_identity(&self, id: i32, sync: IdentitySync) -> DbResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                username = COALESCE($3, username),
                name = COALESCE($4, name),
                bio = COALESCE($5, bio),
                image = COALESCE($6, image),
                location = COALESCE($7, location),
                website = COALESCE($8, website),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&sync.email)
        .bind(&sync.username)
        .bind(&sync.name)
        .bind(&sync.bio)
        .bind(&sync.image)
        .bind(&sync.location)
        .bind(&sync.website)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_profile(&self, id: i32, update: ProfileUpdate) -> DbResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = $2, username = $3, bio = $4, image = $5, location = $6, website = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.username)
        .bind(&update.bio)
        .bind(&update.image)
        .bind(&update.location)
        .bind(&update.website)
        .fetch_optional(&self.pool)
        .await
    }
}
