use uuid::Uuid;

use livraria_core::models::{CreatePublisherRequest, Publisher, UpdatePublisherRequest};
use livraria_core::AppError;
use livraria_db::PublisherRepository;

use super::check_request;

#[derive(Clone)]
pub struct PublisherService {
    publishers: PublisherRepository,
}

impl PublisherService {
    pub fn new(publishers: PublisherRepository) -> Self {
        Self { publishers }
    }

    pub async fn create(&self, request: CreatePublisherRequest) -> Result<Publisher, AppError> {
        check_request(&request)?;
        self.publishers
            .create(&request.name, request.city.as_deref())
            .await
    }

    pub async fn get(&self, id: Uuid) -> Result<Publisher, AppError> {
        self.publishers
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Publisher {} not found", id)))
    }

    pub async fn list(&self) -> Result<Vec<Publisher>, AppError> {
        self.publishers.list().await
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdatePublisherRequest,
    ) -> Result<Publisher, AppError> {
        check_request(&request)?;
        self.publishers
            .update(id, request.name.as_deref(), request.city.as_deref())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Publisher {} not found", id)))
    }

    /// Deletion is refused while any product references the publisher.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let references = self.publishers.referencing_products(id).await?;
        if references > 0 {
            return Err(AppError::Conflict(format!(
                "Publisher is referenced by {} product(s)",
                references
            )));
        }

        if !self.publishers.delete(id).await? {
            return Err(AppError::NotFound(format!("Publisher {} not found", id)));
        }
        Ok(())
    }
}
