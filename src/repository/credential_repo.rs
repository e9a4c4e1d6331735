//! Credential repository (数据库访问层)
//!
//! The gateway core only sees the [`CredentialRepository`] trait. Storage
//! owns the `users` table:
//!
//! ```sql
//! CREATE TABLE users (
//!     id            UUID PRIMARY KEY,
//!     username      TEXT NOT NULL UNIQUE,
//!     password_hash TEXT NOT NULL,
//!     role          TEXT NOT NULL DEFAULT 'regular'
//! );
//! ```

use crate::{
    error::AppError,
    models::user::{Identity, NewIdentity, Role},
};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

pub const USERNAME_TAKEN: &str = "Username is already taken";

/// Lookup and mutation of identity records.
///
/// `insert` must enforce username uniqueness atomically and report a
/// duplicate as [`AppError::Conflict`]; callers rely on that rather than on
/// an existence check beforehand.
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// 根据 ID 查找用户
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, AppError>;

    /// 根据用户名查找用户
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AppError>;

    /// 创建用户
    async fn insert(&self, identity: NewIdentity) -> Result<Identity, AppError>;

    /// 更新角色，用户不存在时返回 None
    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<Identity>, AppError>;

    /// 列出所有用户
    async fn list(&self) -> Result<Vec<Identity>, AppError>;

    /// 删除用户，返回是否存在
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    role: String,
}

impl TryFrom<UserRow> for Identity {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<Role>().map_err(|_| {
            tracing::error!(user_id = %row.id, role = %row.role, "Stored role is not recognized");
            AppError::Internal(format!("unrecognized stored role '{}'", row.role))
        })?;

        Ok(Identity {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            role,
        })
    }
}

/// PostgreSQL-backed credential repository
pub struct PgCredentialRepository {
    db: PgPool,
}

impl PgCredentialRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialRepository for PgCredentialRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Identity::try_from).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;

        row.map(Identity::try_from).transpose()
    }

    async fn insert(&self, identity: NewIdentity) -> Result<Identity, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password_hash, role
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&identity.username)
        .bind(&identity.password_hash)
        .bind(identity.role.as_str())
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(USERNAME_TAKEN.to_string())
            }
            other => AppError::Database(other),
        })?;

        Identity::try_from(row)
    }

    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<Identity>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET role = $2
            WHERE id = $1
            RETURNING id, username, password_hash, role
            "#,
        )
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(&self.db)
        .await?;

        row.map(Identity::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Identity>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role FROM users ORDER BY username",
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Identity::try_from).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
