//! Product repository.
//!
//! Pool-based methods serve reads and single-step writes. The `*_tx` methods
//! take the open transaction and exist for the atomic update sequence: scalar
//! column update plus wholesale replacement of the author association set.

use livraria_core::{
    models::{Author, Category, Product, ProductRecord, Publisher},
    AppError,
};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const COLUMNS: &str = "id, title, description, price, page_count, isbn10, isbn13, \
                       language, image_url, category_id, publisher_id, created_at, updated_at";

/// Scalar columns written on create and update; association handling is
/// separate by design.
#[derive(Debug, Clone)]
pub struct ProductColumns<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub price: Decimal,
    pub page_count: i32,
    pub isbn10: &'a str,
    pub isbn13: &'a str,
    pub language: &'a str,
    pub image_url: Option<&'a str>,
    pub category_id: Uuid,
    pub publisher_id: Uuid,
}

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "products", db.operation = "select", db.record_id = %id))]
    pub async fn find_record(&self, id: Uuid) -> Result<Option<ProductRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, ProductRecord>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Load the full aggregate: the row plus resolved category, publisher and
    /// author set. Used after commit so callers see post-commit state.
    pub async fn find_hydrated(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let Some(record) = self.find_record(id).await? else {
            return Ok(None);
        };

        let category = sqlx::query_as::<Postgres, Category>(
            "SELECT id, name, description, created_at, updated_at FROM categories WHERE id = $1",
        )
        .bind(record.category_id)
        .fetch_one(&self.pool)
        .await?;

        let publisher = sqlx::query_as::<Postgres, Publisher>(
            "SELECT id, name, city, created_at, updated_at FROM publishers WHERE id = $1",
        )
        .bind(record.publisher_id)
        .fetch_one(&self.pool)
        .await?;

        let authors = sqlx::query_as::<Postgres, Author>(
            r#"
            SELECT a.id, a.name, a.bio, a.image_url, a.created_at, a.updated_at
            FROM authors a
            JOIN product_authors pa ON pa.author_id = a.id
            WHERE pa.product_id = $1
            ORDER BY a.name ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Product {
            record,
            category,
            publisher,
            authors,
        }))
    }

    #[tracing::instrument(skip(self), fields(db.table = "products", db.operation = "select"))]
    pub async fn list_records(&self) -> Result<Vec<ProductRecord>, AppError> {
        let records = sqlx::query_as::<Postgres, ProductRecord>(&format!(
            "SELECT {} FROM products ORDER BY title ASC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// True when another product already carries either ISBN.
    pub async fn isbn_taken(
        &self,
        isbn10: &str,
        isbn13: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let taken = sqlx::query_scalar::<Postgres, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM products
                WHERE (isbn10 = $1 OR isbn13 = $2) AND ($3::uuid IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(isbn10)
        .bind(isbn13)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    /// Insert the root row inside the caller's transaction. The id is chosen
    /// by the caller: image objects uploaded ahead of the insert carry it in
    /// their filenames.
    pub async fn insert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        columns: ProductColumns<'_>,
    ) -> Result<ProductRecord, AppError> {
        let record = sqlx::query_as::<Postgres, ProductRecord>(&format!(
            r#"
            INSERT INTO products
                (id, title, description, price, page_count, isbn10, isbn13,
                 language, image_url, category_id, publisher_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(id)
        .bind(columns.title)
        .bind(columns.description)
        .bind(columns.price)
        .bind(columns.page_count)
        .bind(columns.isbn10)
        .bind(columns.isbn13)
        .bind(columns.language)
        .bind(columns.image_url)
        .bind(columns.category_id)
        .bind(columns.publisher_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(record)
    }

    /// Update scalar columns by primary key inside the caller's transaction.
    pub async fn update_scalars_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        columns: ProductColumns<'_>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE products
            SET title = $2, description = $3, price = $4, page_count = $5,
                isbn10 = $6, isbn13 = $7, language = $8, image_url = $9,
                category_id = $10, publisher_id = $11, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(columns.title)
        .bind(columns.description)
        .bind(columns.price)
        .bind(columns.page_count)
        .bind(columns.isbn10)
        .bind(columns.isbn13)
        .bind(columns.language)
        .bind(columns.image_url)
        .bind(columns.category_id)
        .bind(columns.publisher_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Replace the author association set wholesale inside the caller's
    /// transaction. All-old or all-new from any concurrent reader's
    /// perspective once the transaction commits.
    pub async fn replace_authors_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        author_ids: &[Uuid],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM product_authors WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut **tx)
            .await?;

        for author_id in author_ids {
            sqlx::query("INSERT INTO product_authors (product_id, author_id) VALUES ($1, $2)")
                .bind(product_id)
                .bind(author_id)
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "products", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
