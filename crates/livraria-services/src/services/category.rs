use uuid::Uuid;

use livraria_core::models::{Category, CreateCategoryRequest, UpdateCategoryRequest};
use livraria_core::AppError;
use livraria_db::CategoryRepository;

use super::check_request;

#[derive(Clone)]
pub struct CategoryService {
    categories: CategoryRepository,
}

impl CategoryService {
    pub fn new(categories: CategoryRepository) -> Self {
        Self { categories }
    }

    pub async fn create(&self, request: CreateCategoryRequest) -> Result<Category, AppError> {
        check_request(&request)?;
        self.categories
            .create(&request.name, request.description.as_deref())
            .await
    }

    pub async fn get(&self, id: Uuid) -> Result<Category, AppError> {
        self.categories
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    pub async fn list(&self) -> Result<Vec<Category>, AppError> {
        self.categories.list().await
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateCategoryRequest,
    ) -> Result<Category, AppError> {
        check_request(&request)?;
        self.categories
            .update(id, request.name.as_deref(), request.description.as_deref())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    /// Deletion is refused while any product references the category.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let references = self.categories.referencing_products(id).await?;
        if references > 0 {
            return Err(AppError::Conflict(format!(
                "Category is referenced by {} product(s)",
                references
            )));
        }

        if !self.categories.delete(id).await? {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }
        Ok(())
    }
}
