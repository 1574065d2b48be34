use livraria_core::{models::Author, AppError};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const COLUMNS: &str = "id, name, bio, image_url, created_at, updated_at";

#[derive(Clone)]
pub struct AuthorRepository {
    pool: PgPool,
}

impl AuthorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "authors", db.operation = "insert"))]
    pub async fn create(
        &self,
        name: &str,
        bio: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<Author, AppError> {
        let author = sqlx::query_as::<Postgres, Author>(&format!(
            "INSERT INTO authors (name, bio, image_url) VALUES ($1, $2, $3) RETURNING {}",
            COLUMNS
        ))
        .bind(name)
        .bind(bio)
        .bind(image_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(author)
    }

    #[tracing::instrument(skip(self), fields(db.table = "authors", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<Author>, AppError> {
        let author = sqlx::query_as::<Postgres, Author>(&format!(
            "SELECT {} FROM authors WHERE id = $1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(author)
    }

    #[tracing::instrument(skip(self), fields(db.table = "authors", db.operation = "select"))]
    pub async fn list(&self) -> Result<Vec<Author>, AppError> {
        let authors = sqlx::query_as::<Postgres, Author>(&format!(
            "SELECT {} FROM authors ORDER BY name ASC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(authors)
    }

    /// Subset of `ids` that exist. Callers compare lengths to find dangling
    /// references before writing anything.
    pub async fn existing_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found = sqlx::query_scalar::<Postgres, Uuid>(
            "SELECT id FROM authors WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(found)
    }

    #[tracing::instrument(skip(self), fields(db.table = "authors", db.operation = "update", db.record_id = %id))]
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        bio: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<Option<Author>, AppError> {
        let author = sqlx::query_as::<Postgres, Author>(&format!(
            r#"
            UPDATE authors
            SET name = COALESCE($2, name),
                bio = COALESCE($3, bio),
                image_url = COALESCE($4, image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(id)
        .bind(name)
        .bind(bio)
        .bind(image_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(author)
    }

    #[tracing::instrument(skip(self), fields(db.table = "authors", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn referencing_products(&self, id: Uuid) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM product_authors WHERE author_id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
