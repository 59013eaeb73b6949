//! Postgres-backed user store.
//!
//! Maps onto a single `users` table. The unique index on `email` is what
//! detects duplicates; its violation is surfaced as
//! [`RepositoryError::DuplicateEmail`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use userhub_core::UserId;

use super::{RepositoryError, UserRepository};
use crate::{NewUser, User, UserChanges, UserRole};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL UNIQUE,
    role VARCHAR(16) CHECK (role IN ('admin', 'staff')),
    created_at TIMESTAMPTZ DEFAULT now(),
    updated_at TIMESTAMPTZ DEFAULT now()
)
"#;

const COLUMNS: &str = "id, name, email, role, created_at, updated_at";

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect lazily; the first query opens the connection.
    pub fn connect_lazy(database_url: &str) -> Result<Self, RepositoryError> {
        Ok(Self::new(PgPool::connect_lazy(database_url)?))
    }

    /// Create the `users` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

impl core::fmt::Debug for PostgresUserRepository {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PostgresUserRepository").finish_non_exhaustive()
    }
}

fn user_from_row(row: &PgRow) -> Result<User, RepositoryError> {
    let role = row
        .try_get::<Option<String>, _>("role")?
        .map(|r| {
            r.parse::<UserRole>()
                .map_err(|e| RepositoryError::Unavailable(format!("corrupt role column: {e}")))
        })
        .transpose()?;

    Ok(User {
        id: UserId::new(row.try_get::<i64, _>("id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        role,
        created_at: row.try_get::<Option<DateTime<Utc>>, _>("created_at")?,
        updated_at: row.try_get::<Option<DateTime<Utc>>, _>("updated_at")?,
    })
}

fn map_write_error(err: sqlx::Error, email: Option<&str>) -> RepositoryError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return RepositoryError::DuplicateEmail(email.unwrap_or_default().to_string());
        }
    }
    RepositoryError::Database(err)
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query(&format!(
            "INSERT INTO users (name, email, role) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, Some(user.email.as_str())))?;

        let stored = user_from_row(&row)?;
        tracing::debug!(user_id = %stored.id, "user row inserted");
        Ok(stored)
    }

    async fn update(&self, id: UserId, changes: UserChanges) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                updated_at = now()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id.get())
        .bind(changes.name.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.role.map(|r| r.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, changes.email.as_deref()))?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
