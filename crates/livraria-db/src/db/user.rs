//! User repository.
//!
//! Mirrors the product repository's split: pool-based reads, `*_tx` methods
//! for the atomic update of scalar columns plus role-set replacement.

use livraria_core::{
    models::{Role, User, UserRecord},
    AppError,
};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const COLUMNS: &str =
    "id, name, email, password_hash, google_id, image_url, created_at, updated_at";

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select", db.record_id = %id))]
    pub async fn find_record(&self, id: Uuid) -> Result<Option<UserRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, UserRecord>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, UserRecord>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn email_taken(&self, email: &str, exclude: Option<Uuid>) -> Result<bool, AppError> {
        let taken = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    pub async fn find_hydrated(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let Some(record) = self.find_record(id).await? else {
            return Ok(None);
        };

        let roles = self.roles_of(id).await?;
        Ok(Some(User { record, roles }))
    }

    pub async fn roles_of(&self, user_id: Uuid) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<Postgres, Role>(
            r#"
            SELECT r.id, r.name
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn list_records(&self) -> Result<Vec<UserRecord>, AppError> {
        let records = sqlx::query_as::<Postgres, UserRecord>(&format!(
            "SELECT {} FROM users ORDER BY name ASC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    pub async fn insert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
        email: &str,
        password_hash: Option<&str>,
        google_id: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<UserRecord, AppError> {
        let record = sqlx::query_as::<Postgres, UserRecord>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, google_id, image_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(google_id)
        .bind(image_url)
        .fetch_one(&mut **tx)
        .await?;

        Ok(record)
    }

    pub async fn update_scalars_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        name: &str,
        email: &str,
        image_url: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET name = $2, email = $3, image_url = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(image_url)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn replace_roles_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut **tx)
            .await?;

        for role_id in role_ids {
            sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(role_id)
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }

    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
