//! Product management.
//!
//! Create and update follow the same shape: collect every request violation
//! up front, resolve all referenced entities before any write, handle the
//! optional cover image, then update the row and replace the author
//! association set inside one transaction. The returned aggregate is
//! re-fetched after commit so callers always see committed state.

use std::collections::HashSet;
use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use livraria_cdn::ImagePipeline;
use livraria_core::models::{
    CreateProductRequest, Product, ProductRecord, ResourceClass, UpdateProductRequest,
    UploadedImage,
};
use livraria_core::validation::{is_valid_isbn10, is_valid_isbn13};
use livraria_core::AppError;
use livraria_db::{
    with_transaction, AuthorRepository, CategoryRepository, ProductColumns, ProductRepository,
    PublisherRepository,
};

use super::check_request;

#[derive(Clone)]
pub struct ProductService {
    pool: PgPool,
    products: ProductRepository,
    categories: CategoryRepository,
    publishers: PublisherRepository,
    authors: AuthorRepository,
    pipeline: Arc<ImagePipeline>,
}

impl ProductService {
    pub fn new(
        pool: PgPool,
        products: ProductRepository,
        categories: CategoryRepository,
        publishers: PublisherRepository,
        authors: AuthorRepository,
        pipeline: Arc<ImagePipeline>,
    ) -> Self {
        Self {
            pool,
            products,
            categories,
            publishers,
            authors,
            pipeline,
        }
    }

    #[tracing::instrument(skip(self, request, image))]
    pub async fn create(
        &self,
        request: CreateProductRequest,
        image: Option<UploadedImage>,
    ) -> Result<Product, AppError> {
        check_request(&request)?;
        check_isbn_and_authors(&request.isbn10, &request.isbn13, &request.author_ids)?;

        self.resolve_references(
            request.category_id,
            request.publisher_id,
            &request.author_ids,
        )
        .await?;

        if self
            .products
            .isbn_taken(&request.isbn10, &request.isbn13, None)
            .await?
        {
            return Err(AppError::Conflict(
                "A product with this ISBN already exists".to_string(),
            ));
        }

        // The id is fixed before upload so the stored object's filename
        // matches the row it belongs to.
        let id = Uuid::new_v4();
        let image_url = self
            .pipeline
            .handle(image, ResourceClass::Product, id, None)
            .await?;

        let products = self.products.clone();
        let author_ids = request.author_ids.clone();
        let record = with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                let columns = ProductColumns {
                    title: &request.title,
                    description: request.description.as_deref(),
                    price: request.price,
                    page_count: request.page_count,
                    isbn10: &request.isbn10,
                    isbn13: &request.isbn13,
                    language: &request.language,
                    image_url: image_url.as_deref(),
                    category_id: request.category_id,
                    publisher_id: request.publisher_id,
                };
                let record = products.insert_tx(tx, id, columns).await?;
                products.replace_authors_tx(tx, id, &author_ids).await?;
                Ok(record)
            })
        })
        .await?;

        tracing::info!(product_id = %record.id, "Product created");
        self.hydrated(record.id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Product, AppError> {
        self.hydrated(id).await
    }

    pub async fn list(&self) -> Result<Vec<ProductRecord>, AppError> {
        self.products.list_records().await
    }

    /// Full update: scalar columns and the author set change together or not
    /// at all. A failure after the image upload leaves the row untouched; the
    /// orphaned remote object is cleaned up on the next replacement.
    #[tracing::instrument(skip(self, request, image), fields(product_id = %id))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateProductRequest,
        image: Option<UploadedImage>,
    ) -> Result<Product, AppError> {
        check_request(&request)?;
        check_isbn_and_authors(&request.isbn10, &request.isbn13, &request.author_ids)?;

        let existing = self
            .products
            .find_record(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))?;

        self.resolve_references(
            request.category_id,
            request.publisher_id,
            &request.author_ids,
        )
        .await?;

        if self
            .products
            .isbn_taken(&request.isbn10, &request.isbn13, Some(id))
            .await?
        {
            return Err(AppError::Conflict(
                "A product with this ISBN already exists".to_string(),
            ));
        }

        let new_url = self
            .pipeline
            .handle(
                image,
                ResourceClass::Product,
                id,
                existing.image_url.as_deref(),
            )
            .await?;
        let image_url = new_url.or(existing.image_url);

        let products = self.products.clone();
        let author_ids = request.author_ids.clone();
        with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                let columns = ProductColumns {
                    title: &request.title,
                    description: request.description.as_deref(),
                    price: request.price,
                    page_count: request.page_count,
                    isbn10: &request.isbn10,
                    isbn13: &request.isbn13,
                    language: &request.language,
                    image_url: image_url.as_deref(),
                    category_id: request.category_id,
                    publisher_id: request.publisher_id,
                };
                products.update_scalars_tx(tx, id, columns).await?;
                products.replace_authors_tx(tx, id, &author_ids).await?;
                Ok(())
            })
        })
        .await?;

        tracing::info!(product_id = %id, "Product updated");
        self.hydrated(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.products.delete(id).await? {
            return Err(AppError::NotFound(format!("Product {} not found", id)));
        }
        Ok(())
    }

    async fn hydrated(&self, id: Uuid) -> Result<Product, AppError> {
        self.products
            .find_hydrated(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))
    }

    /// Every referenced entity must exist before anything is written.
    async fn resolve_references(
        &self,
        category_id: Uuid,
        publisher_id: Uuid,
        author_ids: &[Uuid],
    ) -> Result<(), AppError> {
        if self.categories.get(category_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Category {} not found",
                category_id
            )));
        }

        if !self.publishers.exists(publisher_id).await? {
            return Err(AppError::NotFound(format!(
                "Publisher {} not found",
                publisher_id
            )));
        }

        let found: HashSet<Uuid> = self
            .authors
            .existing_ids(author_ids)
            .await?
            .into_iter()
            .collect();
        if let Some(missing) = author_ids.iter().find(|id| !found.contains(id)) {
            return Err(AppError::NotFound(format!("Author {} not found", missing)));
        }

        Ok(())
    }
}

/// Request-level checks that `validator` derives cannot express.
fn check_isbn_and_authors(
    isbn10: &str,
    isbn13: &str,
    author_ids: &[Uuid],
) -> Result<(), AppError> {
    let mut violations = Vec::new();

    if !is_valid_isbn10(isbn10) {
        violations.push("Invalid ISBN-10".to_string());
    }
    if !is_valid_isbn13(isbn13) {
        violations.push("Invalid ISBN-13".to_string());
    }
    if author_ids.is_empty() {
        violations.push("At least one author is required".to_string());
    } else {
        let unique: HashSet<&Uuid> = author_ids.iter().collect();
        if unique.len() != author_ids.len() {
            violations.push("Duplicate author ids".to_string());
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(violations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_isbn_pair_and_authors_pass() {
        let authors = vec![Uuid::new_v4()];
        assert!(check_isbn_and_authors("0306406152", "9780306406157", &authors).is_ok());
    }

    #[test]
    fn all_violations_are_collected() {
        let err = check_isbn_and_authors("123", "456", &[]).expect_err("invalid request");
        match err {
            AppError::Validation(violations) => {
                assert_eq!(violations.len(), 3);
                assert!(violations.iter().any(|v| v.contains("ISBN-10")));
                assert!(violations.iter().any(|v| v.contains("ISBN-13")));
                assert!(violations.iter().any(|v| v.contains("author")));
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_author_ids_are_rejected() {
        let id = Uuid::new_v4();
        let err =
            check_isbn_and_authors("0306406152", "9780306406157", &[id, id]).expect_err("dup");
        assert!(matches!(err, AppError::Validation(_)));
    }
}
