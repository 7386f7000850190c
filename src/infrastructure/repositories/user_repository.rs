//! User Repository Implementation
//!
//! PostgreSQL implementation of the UserRepository trait.
//! Maps between the `registered_users` table and the domain RegisteredUser entity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{NewUser, RegisteredUser, UserChanges, UserRepository};
use crate::shared::error::AppError;

/// Database row representation of the `registered_users` table.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    nickname: String,
    email: String,
    password_hash: Option<String>,
    is_active: bool,
    pfp_path: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> RegisteredUser {
        RegisteredUser {
            id: self.id,
            nickname: self.nickname,
            email: self.email,
            password_hash: self.password_hash,
            is_active: self.is_active,
            pfp_path: self.pfp_path,
            description: self.description,
            created_at: self.created_at,
        }
    }
}

const USER_COLUMNS: &str =
    "id, nickname, email, password_hash, is_active, pfp_path, description, created_at";

/// Escape LIKE wildcards so the query is matched literally.
pub(crate) fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn map_unique_violation(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("User with this email or nickname already exists".to_string())
        }
        _ => AppError::Database(e),
    }
}

/// PostgreSQL user repository implementation.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<RegisteredUser>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM registered_users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_user()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<RegisteredUser>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM registered_users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_user()))
    }

    async fn create(&self, user: &NewUser) -> Result<RegisteredUser, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO registered_users (nickname, email, password_hash, is_active)
            VALUES ($1, $2, $3, TRUE)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&user.nickname)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(row.into_user())
    }

    async fn update(&self, id: i64, changes: &UserChanges) -> Result<RegisteredUser, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE registered_users
            SET nickname = COALESCE($2, nickname),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                pfp_path = COALESCE($5, pfp_path),
                description = COALESCE($6, description)
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(&changes.nickname)
        .bind(&changes.email)
        .bind(&changes.password_hash)
        .bind(&changes.pfp_path)
        .bind(&changes.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_violation)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(row.into_user())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let result = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM registered_users WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn nickname_exists(&self, nickname: &str) -> Result<bool, AppError> {
        let result = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM registered_users WHERE nickname = $1)",
        )
        .bind(nickname)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn search_active(
        &self,
        query: &str,
        exclude_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<RegisteredUser>, i64), AppError> {
        let pattern = like_pattern(query);

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM registered_users
            WHERE is_active = TRUE AND id <> $2 AND nickname ILIKE $1
            "#,
        )
        .bind(&pattern)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {}
            FROM registered_users
            WHERE is_active = TRUE AND id <> $2 AND nickname ILIKE $1
            ORDER BY nickname
            LIMIT $3 OFFSET $4
            "#,
            USER_COLUMNS
        ))
        .bind(&pattern)
        .bind(exclude_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(|r| r.into_user()).collect(), total))
    }
}
