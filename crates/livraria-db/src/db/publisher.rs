use livraria_core::{models::Publisher, AppError};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const COLUMNS: &str = "id, name, city, created_at, updated_at";

#[derive(Clone)]
pub struct PublisherRepository {
    pool: PgPool,
}

impl PublisherRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "publishers", db.operation = "insert"))]
    pub async fn create(&self, name: &str, city: Option<&str>) -> Result<Publisher, AppError> {
        let duplicate = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM publishers WHERE name = $1)",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        if duplicate {
            return Err(AppError::Conflict(format!(
                "Publisher '{}' already exists",
                name
            )));
        }

        let publisher = sqlx::query_as::<Postgres, Publisher>(&format!(
            "INSERT INTO publishers (name, city) VALUES ($1, $2) RETURNING {}",
            COLUMNS
        ))
        .bind(name)
        .bind(city)
        .fetch_one(&self.pool)
        .await?;

        Ok(publisher)
    }

    #[tracing::instrument(skip(self), fields(db.table = "publishers", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<Publisher>, AppError> {
        let publisher = sqlx::query_as::<Postgres, Publisher>(&format!(
            "SELECT {} FROM publishers WHERE id = $1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(publisher)
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM publishers WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(skip(self), fields(db.table = "publishers", db.operation = "select"))]
    pub async fn list(&self) -> Result<Vec<Publisher>, AppError> {
        let publishers = sqlx::query_as::<Postgres, Publisher>(&format!(
            "SELECT {} FROM publishers ORDER BY name ASC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(publishers)
    }

    #[tracing::instrument(skip(self), fields(db.table = "publishers", db.operation = "update", db.record_id = %id))]
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        city: Option<&str>,
    ) -> Result<Option<Publisher>, AppError> {
        let publisher = sqlx::query_as::<Postgres, Publisher>(&format!(
            r#"
            UPDATE publishers
            SET name = COALESCE($2, name),
                city = COALESCE($3, city),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(id)
        .bind(name)
        .bind(city)
        .fetch_optional(&self.pool)
        .await?;

        Ok(publisher)
    }

    #[tracing::instrument(skip(self), fields(db.table = "publishers", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM publishers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn referencing_products(&self, id: Uuid) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM products WHERE publisher_id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
