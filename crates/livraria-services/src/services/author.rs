//! Author management, including portrait ingestion through the image
//! pipeline.

use std::sync::Arc;
use uuid::Uuid;

use livraria_cdn::ImagePipeline;
use livraria_core::models::{
    Author, CreateAuthorRequest, ResourceClass, UpdateAuthorRequest, UploadedImage,
};
use livraria_core::AppError;
use livraria_db::AuthorRepository;

use super::check_request;

#[derive(Clone)]
pub struct AuthorService {
    authors: AuthorRepository,
    pipeline: Arc<ImagePipeline>,
}

impl AuthorService {
    pub fn new(authors: AuthorRepository, pipeline: Arc<ImagePipeline>) -> Self {
        Self { authors, pipeline }
    }

    /// Create the author, then ingest the optional portrait. The row exists
    /// before the upload so the stored filename can carry the author id.
    #[tracing::instrument(skip(self, request, portrait))]
    pub async fn create(
        &self,
        request: CreateAuthorRequest,
        portrait: Option<UploadedImage>,
    ) -> Result<Author, AppError> {
        check_request(&request)?;

        let author = self
            .authors
            .create(&request.name, request.bio.as_deref(), None)
            .await?;

        let image_url = self
            .pipeline
            .handle(portrait, ResourceClass::Author, author.id, None)
            .await?;

        match image_url {
            Some(url) => self
                .authors
                .update(author.id, None, None, Some(&url))
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Author {} not found", author.id))),
            None => Ok(author),
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Author, AppError> {
        self.authors
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))
    }

    pub async fn list(&self) -> Result<Vec<Author>, AppError> {
        self.authors.list().await
    }

    /// Update scalar fields and optionally replace the portrait. The previous
    /// remote object is removed best-effort by the pipeline.
    #[tracing::instrument(skip(self, request, portrait), fields(author_id = %id))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateAuthorRequest,
        portrait: Option<UploadedImage>,
    ) -> Result<Author, AppError> {
        check_request(&request)?;

        let existing = self.get(id).await?;

        let image_url = self
            .pipeline
            .handle(
                portrait,
                ResourceClass::Author,
                id,
                existing.image_url.as_deref(),
            )
            .await?;

        self.authors
            .update(
                id,
                request.name.as_deref(),
                request.bio.as_deref(),
                image_url.as_deref(),
            )
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))
    }

    /// Deletion is refused while any product references the author. The
    /// stored portrait is removed best-effort after the row is gone.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let existing = self.get(id).await?;

        let references = self.authors.referencing_products(id).await?;
        if references > 0 {
            return Err(AppError::Conflict(format!(
                "Author is referenced by {} product(s)",
                references
            )));
        }

        if !self.authors.delete(id).await? {
            return Err(AppError::NotFound(format!("Author {} not found", id)));
        }

        if let Some(url) = existing.image_url {
            self.pipeline.remove(&url).await;
        }
        Ok(())
    }
}
