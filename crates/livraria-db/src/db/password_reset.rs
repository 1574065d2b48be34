//! Password reset token storage.
//!
//! Only the SHA-256 digest of a token is persisted; the plaintext token lives
//! exclusively in the recovery email.

use chrono::{DateTime, Utc};
use livraria_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PasswordReset {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_digest: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PasswordResetRepository {
    pool: PgPool,
}

impl PasswordResetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a new reset token digest, discarding any earlier ones for the
    /// same user so only the latest email remains valid.
    #[tracing::instrument(skip(self, token_digest), fields(db.table = "password_resets", db.operation = "insert"))]
    pub async fn insert(
        &self,
        user_id: Uuid,
        token_digest: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordReset, AppError> {
        sqlx::query("DELETE FROM password_resets WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let reset = sqlx::query_as::<Postgres, PasswordReset>(
            r#"
            INSERT INTO password_resets (user_id, token_digest, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token_digest, expires_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(token_digest)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(reset)
    }

    /// Look up an unexpired reset by token digest.
    pub async fn find_valid(&self, token_digest: &str) -> Result<Option<PasswordReset>, AppError> {
        let reset = sqlx::query_as::<Postgres, PasswordReset>(
            r#"
            SELECT id, user_id, token_digest, expires_at, created_at
            FROM password_resets
            WHERE token_digest = $1 AND expires_at > NOW()
            "#,
        )
        .bind(token_digest)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reset)
    }

    /// Remove a reset once used. Single-use tokens.
    pub async fn consume(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM password_resets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
