//! User repository for credential records
//!
//! The session service only needs lookup-by-email and create; both are
//! behind [`UserStore`] so the backing store can be swapped.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// User record from the credential store
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Credential store consumed by the session service
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find user by email (exact, case-sensitive match)
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>>;

    /// Create a new user with an already-encoded password hash
    ///
    /// Returns `None` when the email is already registered, including when
    /// a concurrent create for the same email won.
    async fn create(&self, email: &str, password_hash: &str) -> Result<Option<UserRecord>>;

    /// Check store health
    async fn health_check(&self) -> Result<()>;
}

/// PostgreSQL-backed user store
///
/// Expects a `users` table with `id UUID`, `email TEXT UNIQUE`,
/// `password_hash TEXT` and `created_at TIMESTAMPTZ` columns.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, email: &str, password_hash: &str) -> Result<Option<UserRecord>> {
        // The unique index on email decides races; a losing insert returns no row
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn health_check(&self) -> Result<()> {
        crate::db::health_check(&self.pool).await
    }
}
